//! Repository behavior against the in-memory store.

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use common::{AppError, PageRequest};
use domain::{
    ArchiveForm, ArchiveType, ExamType, Gender, GradeForm, GradePatch, LoginStatus, Student,
    StudentForm, StudentPatch, StudentStatus,
};
use records_service_lib::repository::{
    memory_store, GradeQuery, LoginRecordQuery, StudentQuery, SubjectStat,
};
use records_service_lib::service::Records;
use records_service_lib::store::{contains_pattern, Filter, SortSpec};

fn records() -> Records {
    Records::new(Arc::new(memory_store()))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn student_form(number: &str, name: &str, class_name: &str, status: StudentStatus) -> StudentForm {
    StudentForm {
        student_id: number.to_string(),
        name: name.to_string(),
        gender: Gender::Female,
        birth_date: date(2008, 3, 14),
        phone: None,
        email: Some(format!("{}@school.example", number)),
        address: None,
        class_name: class_name.to_string(),
        enrollment_date: date(2022, 9, 1),
        status,
    }
}

async fn seed_student(records: &Records, number: &str) -> Student {
    records
        .students
        .create(&student_form(number, "Li Wei", "Class 3A", StudentStatus::Active))
        .await
        .unwrap()
}

fn grade_form(student_id: Uuid, subject: &str, score: f64, exam_date: NaiveDate) -> GradeForm {
    GradeForm {
        student_id,
        subject: subject.to_string(),
        score,
        exam_type: ExamType::Quiz,
        exam_date,
        semester: "2024-spring".to_string(),
    }
}

#[tokio::test]
async fn test_pages_never_exceed_page_size() {
    let records = records();
    for i in 0..23 {
        seed_student(&records, &format!("S{:03}", i)).await;
    }

    let sort = SortSpec::desc("created_at");
    let first = records
        .students
        .list(Filter::new(), sort.clone(), PageRequest::new(1, 10).unwrap())
        .await
        .unwrap();
    let last = records
        .students
        .list(Filter::new(), sort, PageRequest::new(3, 10).unwrap())
        .await
        .unwrap();

    assert_eq!(first.data.len(), 10);
    assert_eq!(last.data.len(), 3);
    assert_eq!(last.pagination.total, 23);
    assert_eq!(last.pagination.total_pages, 3);
    assert!(!last.has_next());
}

#[tokio::test]
async fn test_empty_collection_has_zero_pages() {
    let records = records();

    let page = records
        .students
        .find(&StudentQuery::default(), PageRequest::default())
        .await
        .unwrap();

    assert!(page.data.is_empty());
    assert_eq!(page.pagination.total, 0);
    assert_eq!(page.pagination.total_pages, 0);
}

#[tokio::test]
async fn test_create_then_get_round_trips_user_fields() {
    let records = records();
    let form = student_form("S100", "Zhang Min", "Class 1B", StudentStatus::Active);

    let created = records.students.create(&form).await.unwrap();
    let fetched = records.students.get(created.id).await.unwrap();

    assert_eq!(fetched, created);
    assert_eq!(fetched.student_id, form.student_id);
    assert_eq!(fetched.name, form.name);
    assert_eq!(fetched.email, form.email);
    assert_eq!(fetched.class_name, form.class_name);
    assert_eq!(fetched.birth_date, form.birth_date);
    assert_eq!(fetched.status, form.status);
}

#[tokio::test]
async fn test_update_is_idempotent_for_touched_fields() {
    let records = records();
    let student = seed_student(&records, "S200").await;
    let patch = StudentPatch {
        class_name: Some("Class 4C".to_string()),
        status: Some(StudentStatus::Graduated),
        ..Default::default()
    };

    let once = records.students.update(student.id, &patch).await.unwrap();
    let twice = records.students.update(student.id, &patch).await.unwrap();

    assert_eq!(once.class_name, "Class 4C");
    assert_eq!(twice.class_name, once.class_name);
    assert_eq!(twice.status, once.status);
    assert_eq!(twice.name, student.name);
    assert!(twice.updated_at >= student.updated_at);
    assert_eq!(twice.created_at, student.created_at);
}

#[tokio::test]
async fn test_update_of_missing_id_is_not_found() {
    let records = records();
    let result = records
        .students
        .update(Uuid::new_v4(), &StudentPatch::default())
        .await;
    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let records = records();
    let student = seed_student(&records, "S300").await;

    records.students.delete(student.id).await.unwrap();

    assert!(matches!(records.students.get(student.id).await, Err(AppError::NotFound)));
    // deleting again is still a success
    assert!(records.students.delete(student.id).await.is_ok());
}

#[tokio::test]
async fn test_filters_combine_with_and() {
    let records = records();
    let forms = [
        student_form("S401", "Ann", "Class 3A", StudentStatus::Active),
        student_form("S402", "Bo", "Class 3A", StudentStatus::Graduated),
        student_form("S403", "Cy", "Class 2B", StudentStatus::Active),
        student_form("S404", "Di", "class 3a", StudentStatus::Active),
    ];
    for form in &forms {
        records.students.create(form).await.unwrap();
    }

    let filter = Filter::new()
        .eq("status", "active")
        .pattern("class_name", "%3A%");
    let page = records
        .students
        .list(filter, SortSpec::asc("student_id"), PageRequest::default())
        .await
        .unwrap();

    let numbers: Vec<_> = page.data.iter().map(|s| s.student_id.as_str()).collect();
    assert_eq!(numbers, vec!["S401", "S404"]);
}

#[tokio::test]
async fn test_search_matches_name_or_number() {
    let records = records();
    records
        .students
        .create(&student_form("X-17", "Wang Fang", "Class 1A", StudentStatus::Active))
        .await
        .unwrap();
    records
        .students
        .create(&student_form("S017", "Liu Yang", "Class 1A", StudentStatus::Active))
        .await
        .unwrap();

    let by_name = StudentQuery {
        search: Some("fang".to_string()),
        ..Default::default()
    };
    let by_number = StudentQuery {
        search: Some("17".to_string()),
        ..Default::default()
    };

    let page = records.students.find(&by_name, PageRequest::default()).await.unwrap();
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.data[0].name, "Wang Fang");

    let page = records.students.find(&by_number, PageRequest::default()).await.unwrap();
    assert_eq!(page.pagination.total, 2);
}

#[tokio::test]
async fn test_search_treats_wildcards_literally() {
    let records = records();
    seed_student(&records, "S500").await;

    let filter = Filter::new().pattern("name", contains_pattern("%"));
    let page = records
        .students
        .list(filter, SortSpec::asc("name"), PageRequest::default())
        .await
        .unwrap();

    assert_eq!(page.pagination.total, 0);
}

#[tokio::test]
async fn test_duplicate_student_number_is_validation_error() {
    let records = records();
    seed_student(&records, "S600").await;

    let result = records
        .students
        .create(&student_form("S600", "Other", "Class 1A", StudentStatus::Active))
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(records.students.state().error().await.is_some());
}

#[tokio::test]
async fn test_grades_join_student_and_sort_by_exam_date() {
    let records = records();
    let student = seed_student(&records, "S700").await;
    records
        .grades
        .create(&grade_form(student.id, "math", 80.0, date(2024, 3, 1)))
        .await
        .unwrap();
    records
        .grades
        .create(&grade_form(student.id, "physics", 91.5, date(2024, 5, 1)))
        .await
        .unwrap();

    let query = GradeQuery {
        student_id: Some(student.id),
        subject: None,
    };
    let page = records.grades.find(&query, PageRequest::default()).await.unwrap();

    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[0].subject, "physics");
    let summary = page.data[0].student.as_ref().unwrap();
    assert_eq!(summary.name, student.name);
    assert_eq!(summary.student_id, "S700");
}

#[tokio::test]
async fn test_updated_grade_keeps_joined_student() {
    let records = records();
    let student = seed_student(&records, "S750").await;
    let grade = records
        .grades
        .create(&grade_form(student.id, "math", 70.0, date(2024, 3, 1)))
        .await
        .unwrap();
    records
        .grades
        .find(&GradeQuery::default(), PageRequest::default())
        .await
        .unwrap();

    let patch = GradePatch {
        score: Some(88.0),
        ..Default::default()
    };
    let updated = records.grades.update(grade.id, &patch).await.unwrap();

    assert_eq!(updated.score, 88.0);
    assert_eq!(updated.student.map(|s| s.student_id).as_deref(), Some("S750"));
    let cached = records.grades.state().items().await;
    assert_eq!(cached[0].score, 88.0);
    assert!(cached[0].student.is_some());
}

#[tokio::test]
async fn test_aggregate_groups_in_first_occurrence_order() {
    let records = records();
    let student = seed_student(&records, "S800").await;
    for (subject, score) in [("A", 10.0), ("A", 20.0), ("B", 5.0)] {
        records
            .grades
            .create(&grade_form(student.id, subject, score, date(2024, 1, 10)))
            .await
            .unwrap();
    }

    let stats = records.grades.student_stats(student.id).await.unwrap();

    assert_eq!(
        stats,
        vec![
            SubjectStat { subject: "A".into(), average: 15.0, count: 2 },
            SubjectStat { subject: "B".into(), average: 5.0, count: 1 },
        ]
    );
    assert!(records.grades.student_stats(Uuid::new_v4()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_archive_records_its_author() {
    let records = records();
    let student = seed_student(&records, "S900").await;
    let author = Uuid::new_v4();
    let form = ArchiveForm {
        student_id: student.id,
        title: "Math olympiad".to_string(),
        content: "Second prize".to_string(),
        kind: ArchiveType::Reward,
        date: date(2024, 6, 2),
    };

    let archive = records.archives.create_for(&form, author).await.unwrap();
    let fetched = records.archives.get(archive.id).await.unwrap();

    assert_eq!(fetched.created_by, author);
    assert_eq!(fetched.kind, ArchiveType::Reward);
    assert_eq!(fetched.student.map(|s| s.student_id).as_deref(), Some("S900"));
}

#[tokio::test]
async fn test_login_records_are_append_only() {
    let records = records();
    let user = Uuid::new_v4();

    let record = records
        .login_records
        .record_login(user, "10.0.0.7".into(), "curl/8".into(), LoginStatus::Success)
        .await
        .unwrap();

    assert_eq!(record.user_id, user);
    assert!(matches!(
        records.login_records.delete(record.id).await,
        Err(AppError::Validation(_))
    ));
    assert!(records.login_records.get(record.id).await.is_ok());
}

#[tokio::test]
async fn test_login_records_filter_by_user_newest_first() {
    let records = records();
    let user = Uuid::new_v4();
    for agent in ["first", "second", "third"] {
        records
            .login_records
            .record_login(user, "10.0.0.7".into(), agent.into(), LoginStatus::Success)
            .await
            .unwrap();
    }
    records
        .login_records
        .record_login(Uuid::new_v4(), "10.0.0.8".into(), "other".into(), LoginStatus::Failed)
        .await
        .unwrap();

    let query = LoginRecordQuery { user_id: Some(user) };
    let page = records
        .login_records
        .find(&query, PageRequest::default())
        .await
        .unwrap();

    assert_eq!(page.pagination.total, 3);
    assert!(page.data.windows(2).all(|w| w[0].login_time >= w[1].login_time));
    assert!(page.data.iter().all(|r| r.user_id == user));
}

#[tokio::test]
async fn test_snapshot_tracks_mutations() {
    let records = records();
    let student = seed_student(&records, "S950").await;
    assert!(records.students.state().is_stale().await);

    records
        .students
        .find(&StudentQuery::default(), PageRequest::default())
        .await
        .unwrap();
    assert!(!records.students.state().is_stale().await);

    let patch = StudentPatch {
        name: Some("Renamed".to_string()),
        ..Default::default()
    };
    records.students.update(student.id, &patch).await.unwrap();
    assert_eq!(records.students.state().items().await[0].name, "Renamed");

    records.students.delete(student.id).await.unwrap();
    assert!(records.students.state().items().await.is_empty());
    assert!(!records.students.state().is_loading());
}
