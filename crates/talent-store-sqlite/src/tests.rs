//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, TimeZone, Utc};
use talent_core::{
  Record, ResourceKind,
  entity::{Application, Competence, Employee, EmploymentType, JobFunction, JobPosting, Skill},
  history::{ChangeAction, NewAuditEntry},
  store::{DateBound, DateOp, FilterValue, ListQuery, SortDirection, TalentStore, Timestamp},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn employee() -> Employee { Employee::new("https://cc.example.org/people/1") }

fn posting(name: &str) -> JobPosting {
  JobPosting {
    name: name.into(),
    title: name.into(),
    employment_type: EmploymentType::FullTime,
    job_location_type: "TELECOMMUTE".into(),
    job_start_date: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    standard_hours: 40,
    ..JobPosting::default()
  }
}

fn skill(name: &str, employee: Option<Uuid>) -> Skill {
  Skill { name: name.into(), employee, ..Skill::default() }
}

fn violations(err: Error) -> talent_core::validate::Violations {
  match err {
    Error::Core(talent_core::Error::Validation(v)) => v,
    other => panic!("expected a validation error, got {other:?}"),
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_assigns_distinct_v4_ids() {
  let s = store().await;
  let a = s.create(employee()).await.unwrap();
  let b = s.create(employee()).await.unwrap();

  assert_ne!(a.id, b.id);
  assert_eq!(a.id.get_version_num(), 4);
  assert_eq!(a.date_created, a.date_modified);
  assert_eq!(a.person, "https://cc.example.org/people/1");
}

#[tokio::test]
async fn get_round_trips_and_missing_is_none() {
  let s = store().await;
  let created = s.create(posting("Backend")).await.unwrap();

  let fetched: Record<JobPosting> = s.get(created.id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "Backend");
  assert_eq!(fetched.standard_hours, 40);
  assert_eq!(fetched.date_created, created.date_created);

  assert!(s.get::<JobPosting>(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn create_with_id_pins_the_id_and_rejects_duplicates() {
  let s = store().await;
  let id = Uuid::parse_str("3824d042-4b1a-4024-8e83-7943dc9b0e83").unwrap();
  let created = s.create_with_id(id, posting("Test Vacature")).await.unwrap();
  assert_eq!(created.id, id);

  let err = s.create_with_id(id, posting("Again")).await.unwrap_err();
  assert!(matches!(err, Error::Core(talent_core::Error::Conflict(_))));
}

// ─── Validation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn invalid_entities_are_not_persisted() {
  let s = store().await;
  let err = s.create(Employee::new("not a url")).await.unwrap_err();
  assert!(violations(err).has("person"));

  let all: Vec<Record<Employee>> = s.list(&ListQuery::default()).await.unwrap();
  assert!(all.is_empty());
}

#[tokio::test]
async fn unknown_references_are_violations() {
  let s = store().await;
  let err = s.create(skill("php", Some(Uuid::new_v4()))).await.unwrap_err();
  assert!(violations(err).has("employee"));

  let mut e = employee();
  e.skills = Some(vec![Uuid::new_v4()]);
  let err = s.create(e).await.unwrap_err();
  assert!(violations(err).has("skills"));
}

// ─── One-to-one ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn owning_side_write_is_visible_from_the_employee() {
  let s = store().await;
  let e = s.create(employee()).await.unwrap();
  let p = s
    .create(JobPosting { employee: Some(e.id), ..posting("Frontend") })
    .await
    .unwrap();

  assert_eq!(p.employee, Some(e.id));
  let e: Record<Employee> = s.get(e.id).await.unwrap().unwrap();
  assert_eq!(e.job_posting, Some(p.id));
}

#[tokio::test]
async fn inverse_side_write_sets_the_owning_column() {
  let s = store().await;
  let p = s.create(posting("Frontend")).await.unwrap();

  let mut e = employee();
  e.job_posting = Some(p.id);
  let e = s.create(e).await.unwrap();
  assert_eq!(e.job_posting, Some(p.id));

  let p: Record<JobPosting> = s.get(p.id).await.unwrap().unwrap();
  assert_eq!(p.employee, Some(e.id));
}

#[tokio::test]
async fn relinking_moves_the_one_to_one_link() {
  let s = store().await;
  let e = s.create(employee()).await.unwrap();
  let first = s
    .create(JobPosting { employee: Some(e.id), ..posting("First") })
    .await
    .unwrap();
  let second = s
    .create(JobPosting { employee: Some(e.id), ..posting("Second") })
    .await
    .unwrap();

  let first: Record<JobPosting> = s.get(first.id).await.unwrap().unwrap();
  assert_eq!(first.employee, None);
  let e: Record<Employee> = s.get(e.id).await.unwrap().unwrap();
  assert_eq!(e.job_posting, Some(second.id));

  let log = s.change_log(ResourceKind::JobPosting, first.id).await.unwrap();
  let last = log.last().unwrap();
  assert_eq!(last.action, ChangeAction::Update);
  assert_eq!(last.data["employee"], serde_json::Value::Null);
}

#[tokio::test]
async fn deleting_the_employee_detaches_the_posting() {
  let s = store().await;
  let e = s.create(employee()).await.unwrap();
  let p = s
    .create(JobPosting { employee: Some(e.id), ..posting("Frontend") })
    .await
    .unwrap();

  s.delete(ResourceKind::Employee, e.id).await.unwrap();

  let p: Record<JobPosting> = s.get(p.id).await.unwrap().unwrap();
  assert_eq!(p.employee, None);
  assert!(!s.exists(ResourceKind::Employee, e.id).await.unwrap());
}

#[tokio::test]
async fn relinking_logs_the_displaced_posting() {
  let s = store().await;
  let e = s.create(employee()).await.unwrap();
  let first = s
    .create(JobPosting { employee: Some(e.id), ..posting("First") })
    .await
    .unwrap();

  let mut relink = employee();
  relink.job_posting = Some(s.create(posting("Second")).await.unwrap().id);
  s.replace(e.id, relink).await.unwrap();

  let log = s.change_log(ResourceKind::JobPosting, first.id).await.unwrap();
  let entries: Vec<_> = log.iter().map(|l| (l.action, l.version)).collect();
  assert_eq!(entries, [(ChangeAction::Create, 1), (ChangeAction::Update, 2)]);
  assert_eq!(log[1].data, serde_json::json!({"employee": null}).as_object().unwrap().clone());
}

// ─── Many-to-one ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn children_appear_on_the_employee() {
  let s = store().await;
  let e = s.create(employee()).await.unwrap();
  let php = s.create(skill("php", Some(e.id))).await.unwrap();
  let js = s.create(skill("javascript", Some(e.id))).await.unwrap();

  let e: Record<Employee> = s.get(e.id).await.unwrap().unwrap();
  assert_eq!(e.skills.as_deref(), Some(&[php.id, js.id][..]));
  assert_eq!(e.goals.as_deref(), Some(&[][..]));
}

#[tokio::test]
async fn inverse_list_write_syncs_children() {
  let s = store().await;
  let e = s.create(employee()).await.unwrap();
  let php = s.create(skill("php", Some(e.id))).await.unwrap();
  let js = s.create(skill("javascript", None)).await.unwrap();

  let mut update = employee();
  update.skills = Some(vec![js.id]);
  let e = s.replace(e.id, update).await.unwrap();
  assert_eq!(e.skills, Some(vec![js.id]));

  let php: Record<Skill> = s.get(php.id).await.unwrap().unwrap();
  assert_eq!(php.employee, None, "dropped child is detached, not deleted");
  let js: Record<Skill> = s.get(js.id).await.unwrap().unwrap();
  assert_eq!(js.employee, Some(e.id));
}

#[tokio::test]
async fn absent_inverse_field_leaves_children_alone() {
  let s = store().await;
  let e = s.create(employee()).await.unwrap();
  let c = s
    .create(Competence { name: "teamwork".into(), employee: Some(e.id), ..Competence::default() })
    .await
    .unwrap();

  let mut update = employee();
  update.has_police_certificate = true;
  let e = s.replace(e.id, update).await.unwrap();

  assert!(e.has_police_certificate);
  assert_eq!(e.competencies, Some(vec![c.id]));
}

#[tokio::test]
async fn deleting_the_employee_logs_each_detached_child() {
  let s = store().await;
  let e = s.create(employee()).await.unwrap();
  let php = s.create(skill("php", Some(e.id))).await.unwrap();
  let p = s
    .create(JobPosting { employee: Some(e.id), ..posting("Frontend") })
    .await
    .unwrap();

  s.delete(ResourceKind::Employee, e.id).await.unwrap();

  for (kind, id) in [(ResourceKind::Skill, php.id), (ResourceKind::JobPosting, p.id)] {
    let log = s.change_log(kind, id).await.unwrap();
    assert_eq!(log.len(), 2, "{kind}");
    assert_eq!(log[1].action, ChangeAction::Update);
    assert_eq!(log[1].version, 2);
    assert_eq!(log[1].data.len(), 1);
    assert_eq!(log[1].data["employee"], serde_json::Value::Null);
  }
}

#[tokio::test]
async fn application_links_both_sides() {
  let s = store().await;
  let e = s.create(employee()).await.unwrap();
  let p = s.create(posting("Frontend")).await.unwrap();
  let a = s
    .create(Application { employee: Some(e.id), job_posting: Some(p.id), ..Application::default() })
    .await
    .unwrap();

  let p: Record<JobPosting> = s.get(p.id).await.unwrap().unwrap();
  assert_eq!(p.applications, Some(vec![a.id]));
  let e: Record<Employee> = s.get(e.id).await.unwrap().unwrap();
  assert_eq!(e.applications, Some(vec![a.id]));

  s.delete(ResourceKind::JobPosting, p.id).await.unwrap();
  let a: Record<Application> = s.get(a.id).await.unwrap().unwrap();
  assert_eq!(a.job_posting, None);
  assert_eq!(a.employee, Some(e.id));
}

// ─── Replace / delete ────────────────────────────────────────────────────────

#[tokio::test]
async fn replace_missing_record_is_not_found() {
  let s = store().await;
  let err = s.replace(Uuid::new_v4(), employee()).await.unwrap_err();
  assert!(matches!(err, Error::Core(talent_core::Error::NotFound { .. })));

  let err = s.delete(ResourceKind::Skill, Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::Core(talent_core::Error::NotFound { .. })));
}

#[tokio::test]
async fn replace_bumps_date_modified_only() {
  let s = store().await;
  let created = s.create(posting("Frontend")).await.unwrap();
  let replaced = s.replace(created.id, posting("Backend")).await.unwrap();

  assert_eq!(replaced.date_created, created.date_created);
  assert!(replaced.date_modified >= created.date_modified);
  assert_eq!(replaced.name, "Backend");
}

#[tokio::test]
async fn conditional_writes_see_the_latest_state() {
  let s = store().await;
  let seen = s.create(skill("php", None)).await.unwrap();
  let moved = seen.date_modified;

  s.replace(seen.id, skill("rust", None)).await.unwrap();

  let err = s
    .replace_if(seen.id, skill("go", None), move |current: &Record<Skill>| {
      current.date_modified == moved && current.name == "php"
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(talent_core::Error::PreconditionFailed { .. })));

  let err = s
    .delete_if::<Skill, _>(seen.id, |current| current.name == "php")
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(talent_core::Error::PreconditionFailed { .. })));

  let current: Record<Skill> = s.get(seen.id).await.unwrap().unwrap();
  assert_eq!(current.name, "rust");
  assert_eq!(s.change_log(ResourceKind::Skill, seen.id).await.unwrap().len(), 2);

  let replaced = s
    .replace_if(seen.id, skill("go", None), |current: &Record<Skill>| current.name == "rust")
    .await
    .unwrap();
  assert_eq!(replaced.name, "go");
  s.delete_if::<Skill, _>(seen.id, |current| current.name == "go").await.unwrap();
  assert!(!s.exists(ResourceKind::Skill, seen.id).await.unwrap());
}

// ─── Change log ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn change_log_versions_increase() {
  let s = store().await;
  let created = s.create(posting("Frontend")).await.unwrap();
  s.replace(created.id, posting("Backend")).await.unwrap();

  let log = s.change_log(ResourceKind::JobPosting, created.id).await.unwrap();
  assert_eq!(log.len(), 2);
  assert_eq!(log[0].action, ChangeAction::Create);
  assert_eq!(log[0].version, 1);
  assert_eq!(log[0].data["name"], "Frontend");
  assert!(!log[0].data.contains_key("description"));

  assert_eq!(log[1].action, ChangeAction::Update);
  assert_eq!(log[1].version, 2);
  assert_eq!(log[1].data["name"], "Backend");
  assert!(!log[1].data.contains_key("standard_hours"));
}

#[tokio::test]
async fn unchanged_replace_writes_no_entry() {
  let s = store().await;
  let created = s.create(posting("Frontend")).await.unwrap();
  s.replace(created.id, posting("Frontend")).await.unwrap();

  let log = s.change_log(ResourceKind::JobPosting, created.id).await.unwrap();
  assert_eq!(log.len(), 1);
}

#[tokio::test]
async fn change_log_of_missing_record_is_not_found() {
  let s = store().await;
  let created = s.create(skill("php", None)).await.unwrap();
  s.delete(ResourceKind::Skill, created.id).await.unwrap();

  let err = s.change_log(ResourceKind::Skill, created.id).await.unwrap_err();
  assert!(matches!(err, Error::Core(talent_core::Error::NotFound { .. })));
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_filters_by_relation_and_attribute() {
  let s = store().await;
  let e = s.create(employee()).await.unwrap();
  s.create(Skill { level: Some("beginner".into()), ..skill("php", Some(e.id)) })
    .await
    .unwrap();
  s.create(Skill { level: Some("expert".into()), ..skill("rust", Some(e.id)) })
    .await
    .unwrap();
  s.create(Skill { level: Some("beginner".into()), ..skill("go", None) })
    .await
    .unwrap();

  let query = ListQuery {
    relations: vec![("employee".into(), e.id)],
    attributes: vec![("level".into(), FilterValue::Text("beginner".into()))],
    ..ListQuery::default()
  };
  let found: Vec<Record<Skill>> = s.list(&query).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].name, "php");
}

#[tokio::test]
async fn list_filters_typed_values() {
  let s = store().await;
  s.create(employee()).await.unwrap();
  let mut certified = employee();
  certified.has_police_certificate = true;
  s.create(certified).await.unwrap();
  s.create(JobPosting { standard_hours: 32, ..posting("Part") }).await.unwrap();
  s.create(posting("Full")).await.unwrap();

  let query = ListQuery {
    attributes: vec![("has_police_certificate".into(), FilterValue::Bool(true))],
    ..ListQuery::default()
  };
  let found: Vec<Record<Employee>> = s.list(&query).await.unwrap();
  assert_eq!(found.len(), 1);
  assert!(found[0].has_police_certificate);

  let query = ListQuery {
    attributes: vec![("standard_hours".into(), FilterValue::Integer(32))],
    ..ListQuery::default()
  };
  let found: Vec<Record<JobPosting>> = s.list(&query).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].name, "Part");
}

#[tokio::test]
async fn numeric_looking_text_still_matches() {
  let s = store().await;
  s.create(skill("2024", None)).await.unwrap();
  s.create(skill("php", None)).await.unwrap();
  s.create(JobFunction {
    name: "Developer".into(),
    salary_scale: Some("10".into()),
    ..JobFunction::default()
  })
  .await
  .unwrap();

  let query = ListQuery {
    attributes: vec![("name".into(), FilterValue::parse("2024"))],
    ..ListQuery::default()
  };
  let found: Vec<Record<Skill>> = s.list(&query).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].name, "2024");

  let query = ListQuery {
    attributes: vec![("salary_scale".into(), FilterValue::parse("10"))],
    ..ListQuery::default()
  };
  let found: Vec<Record<JobFunction>> = s.list(&query).await.unwrap();
  assert_eq!(found.len(), 1);

  let query = ListQuery {
    attributes: vec![("salary_scale".into(), FilterValue::parse("010"))],
    ..ListQuery::default()
  };
  let found: Vec<Record<JobFunction>> = s.list(&query).await.unwrap();
  assert!(found.is_empty());
}

#[tokio::test]
async fn list_orders_and_paginates() {
  let s = store().await;
  for name in ["b", "c", "a", "d"] {
    s.create(skill(name, None)).await.unwrap();
  }

  let query = ListQuery {
    order: vec![("name".into(), SortDirection::Desc)],
    limit: Some(2),
    offset: Some(1),
    ..ListQuery::default()
  };
  let page: Vec<Record<Skill>> = s.list(&query).await.unwrap();
  let names: Vec<_> = page.iter().map(|r| r.name.as_str()).collect();
  assert_eq!(names, ["c", "b"]);

  let all: Vec<Record<Skill>> = s.list(&ListQuery::default()).await.unwrap();
  let names: Vec<_> = all.iter().map(|r| r.name.as_str()).collect();
  assert_eq!(names, ["b", "c", "a", "d"], "default order is insertion order");
}

#[tokio::test]
async fn list_date_bounds() {
  let s = store().await;
  let before = Utc::now() - Duration::hours(1);
  s.create(skill("php", None)).await.unwrap();

  let query = |op| ListQuery {
    date_bounds: vec![DateBound { field: Timestamp::DateCreated, op, at: before }],
    ..ListQuery::default()
  };
  let after: Vec<Record<Skill>> = s.list(&query(DateOp::StrictlyAfter)).await.unwrap();
  assert_eq!(after.len(), 1);
  let earlier: Vec<Record<Skill>> = s.list(&query(DateOp::Before)).await.unwrap();
  assert!(earlier.is_empty());
}

#[tokio::test]
async fn list_rejects_unsafe_field_names() {
  let s = store().await;
  let query = ListQuery {
    attributes: vec![("name') OR 1=1 --".into(), FilterValue::Text("x".into()))],
    order: vec![("Name".into(), SortDirection::Asc)],
    ..ListQuery::default()
  };
  let err = s.list::<Skill>(&query).await.unwrap_err();
  assert_eq!(violations(err).len(), 2);

  let query = ListQuery {
    relations: vec![("job_posting".into(), Uuid::new_v4())],
    ..ListQuery::default()
  };
  let err = s.list::<Skill>(&query).await.unwrap_err();
  assert!(violations(err).has("job_posting"));
}

// ─── Audit trail ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn audit_entries_are_recorded_in_order() {
  let s = store().await;
  let e = s.create(employee()).await.unwrap();

  for (method, status) in [("GET", 200), ("PUT", 400)] {
    s.record_audit(NewAuditEntry {
      resource_kind: ResourceKind::Employee,
      resource_id:   e.id,
      method:        method.into(),
      route:         Some("/employees/{id}".into()),
      endpoint:      format!("/employees/{}", e.id),
      status_code:   status,
      content_type:  None,
      accept:        Some("application/json".into()),
      user_agent:    Some("test".into()),
      username:      Some("alice".into()),
    })
    .await
    .unwrap();
  }

  let trail = s.audit_trail(ResourceKind::Employee, e.id).await.unwrap();
  assert_eq!(trail.len(), 2);
  assert_eq!(trail[0].method, "GET");
  assert_eq!(trail[0].status_code, 200);
  assert_eq!(trail[1].status_code, 400);
  assert_eq!(trail[1].username.as_deref(), Some("alice"));
}
