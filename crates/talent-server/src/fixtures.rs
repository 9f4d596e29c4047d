//! Demo data, gated on the deployment domain.
//!
//! Each [`FixtureSet`] lists the domains it belongs to. A set loads when
//! `build_all_fixtures` is on, or when the configured domain is one of its
//! domains or a subdomain of one. Every record has a fixed id (pinned, or a
//! UUIDv5 of its fixture name), so loading twice creates nothing new.

use anyhow::Context as _;
use chrono::{DateTime, Duration, Utc};
use talent_commonground::{CommonGroundClient, ResourceRef};
use talent_core::{
  Entity,
  entity::{Competence, Employee, EmploymentType, JobPosting, Skill},
  store::TalentStore,
};
use uuid::Uuid;

// ─── Sets ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureSet {
  pub name:    &'static str,
  pub domains: &'static [&'static str],
}

impl FixtureSet {
  pub fn applies(&self, app_domain: &str, build_all: bool) -> bool {
    if build_all {
      return true;
    }
    let app_domain = app_domain.trim().trim_end_matches('.').to_ascii_lowercase();
    self.domains.iter().any(|d| {
      app_domain == *d
        || app_domain
          .strip_suffix(d)
          .is_some_and(|prefix| prefix.ends_with('.'))
    })
  }
}

pub const CONDUCTION: FixtureSet = FixtureSet {
  name:    "conduction",
  domains: &["zuiddrecht.nl", "zuid-drecht.nl"],
};

pub const STAGE: FixtureSet = FixtureSet {
  name:    "stage",
  domains: &["zuiddrecht.nl", "zuid-drecht.nl", "conduction.academy"],
};

pub const ALL: [FixtureSet; 2] = [CONDUCTION, STAGE];

const TEST_VACATURE: Uuid = Uuid::from_u128(0x3824d042_4b1a_4024_8e83_7943dc9b0e83);
const FULL_STACK_DEVELOPER: Uuid = Uuid::from_u128(0x056b486e_d598_47fa_b234_c0323f076a0b);

const CONDUCTION_ORGANIZATION: &str = "9650a44d-d7d1-454a-ab4f-2338c90e8c2f";
const WRC_ORGANIZATION: &str = "c571bdad-f34c-4e24-94e7-74629cfaccc9";
const STAGE_PERSON: &str = "d961291d-f5c1-46f4-8b4a-6abb41df88db";

/// Deterministic id for a fixture record that has no pinned id.
fn fixture_id(set: &FixtureSet, key: &str) -> Uuid {
  Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("urn:talent:fixture:{}:{key}", set.name).as_bytes())
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// What one set did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureReport {
  pub set:     &'static str,
  pub created: usize,
  pub skipped: usize,
}

struct Loader<'a, S> {
  store:  &'a S,
  report: FixtureReport,
}

impl<S: TalentStore> Loader<'_, S> {
  /// Create `entity` under `id` unless that id is already taken.
  async fn ensure<E: Entity>(&mut self, id: Uuid, entity: E) -> anyhow::Result<()> {
    let taken = self
      .store
      .exists(E::KIND, id)
      .await
      .with_context(|| format!("checking {} {id}", E::KIND))?;
    if taken {
      self.report.skipped += 1;
      return Ok(());
    }
    self
      .store
      .create_with_id(id, entity)
      .await
      .with_context(|| format!("creating {} {id}", E::KIND))?;
    self.report.created += 1;
    Ok(())
  }
}

/// Load every set that applies to `app_domain`.
pub async fn load_all<S: TalentStore>(
  store: &S,
  commonground: &CommonGroundClient,
  app_domain: &str,
  build_all: bool,
) -> anyhow::Result<Vec<FixtureReport>> {
  let mut reports = Vec::new();
  for set in ALL {
    if !set.applies(app_domain, build_all) {
      tracing::debug!(set = set.name, app_domain, "fixture set does not apply");
      continue;
    }
    let report = load_set(store, commonground, &set).await?;
    tracing::info!(set = report.set, created = report.created, skipped = report.skipped, "loaded fixtures");
    reports.push(report);
  }
  Ok(reports)
}

pub async fn load_set<S: TalentStore>(
  store: &S,
  commonground: &CommonGroundClient,
  set: &FixtureSet,
) -> anyhow::Result<FixtureReport> {
  let mut loader = Loader {
    store,
    report: FixtureReport { set: set.name, ..FixtureReport::default() },
  };
  let seven_weeks_ago = Utc::now() - Duration::weeks(7);

  match set.name {
    "conduction" => {
      let org = commonground.clean_url(ResourceRef::new("cc", "organizations", CONDUCTION_ORGANIZATION))?;
      loader
        .ensure(TEST_VACATURE, test_vacature("TELECOMMUTE", org, seven_weeks_ago))
        .await?;
    }
    "stage" => load_stage(&mut loader, commonground, set, seven_weeks_ago).await?,
    other => anyhow::bail!("unknown fixture set {other:?}"),
  }
  Ok(loader.report)
}

fn test_vacature(location: &str, hiring_organization: String, start: DateTime<Utc>) -> JobPosting {
  JobPosting {
    name: "Test Vacature".into(),
    title: "Test Vacature".into(),
    description: Some("Dit is de beschrijving van deze test vacature".into()),
    employment_type: EmploymentType::FullTime,
    job_location_type: location.into(),
    hiring_organization: Some(hiring_organization),
    job_start_date: start,
    valid_through: Some(start),
    standard_hours: 40,
    ..JobPosting::default()
  }
}

async fn load_stage<S: TalentStore>(
  loader: &mut Loader<'_, S>,
  commonground: &CommonGroundClient,
  set: &FixtureSet,
  start: DateTime<Utc>,
) -> anyhow::Result<()> {
  let person = commonground.clean_url(ResourceRef::new("cc", "people", STAGE_PERSON))?;
  let org = commonground.clean_url(ResourceRef::new("wrc", "organizations", WRC_ORGANIZATION))?;

  let mut employee = Employee::new(person);
  employee.organization = Some(org.clone());
  loader.ensure(fixture_id(set, "employee"), employee).await?;

  loader
    .ensure(TEST_VACATURE, test_vacature("telecommute", org.clone(), start))
    .await?;

  for (name, description) in [
    ("php", "basis php kennis"),
    ("javascript", "basis javascript kennis"),
  ] {
    let skill = Skill {
      name: name.into(),
      description: Some(description.into()),
      level: Some("beginner".into()),
      employee: None,
    };
    loader.ensure(fixture_id(set, &format!("skill/{name}")), skill).await?;
  }

  for (name, description, grade) in [
    ("teamwork", "hoe goed werk jij in teamverband", "goed"),
    ("plannen", "hoe goed ben jij in plannen", "gemiddeld"),
  ] {
    let competence = Competence {
      name: name.into(),
      description: Some(description.into()),
      grade: Some(grade.into()),
      employee: None,
    };
    loader
      .ensure(fixture_id(set, &format!("competence/{name}")), competence)
      .await?;
  }

  let posting = JobPosting {
    name: "Full stack developer".into(),
    title: "Full stack developer".into(),
    description: Some(FULL_STACK_DESCRIPTION.into()),
    employment_type: EmploymentType::Internship,
    education_requirements: FULL_STACK_REQUIREMENTS.iter().map(|r| (*r).to_owned()).collect(),
    base_salary: None,
    job_location_type: "Amsterdam".into(),
    hiring_organization: Some(org),
    job_start_date: start,
    valid_through: Some(start),
    standard_hours: 40,
    ..JobPosting::default()
  };
  loader.ensure(FULL_STACK_DEVELOPER, posting).await
}

const FULL_STACK_DESCRIPTION: &str = "Lijkt jou het leuk om mee te werken aan super vette projecten \
  waarbij wij de laatste technieken gebruiken? Ben je op zoek naar uitdaging in je werk en wil je je \
  skills een enorme boost geven door het werken met top notch developers? Als jij die gedreven, \
  leergierige en ook een beetje chaos-bestendig bent, dan ben je bij ons aan het juiste adres!  \
  Solliciteer en hopelijk kunnen we je snel verwelkomen in ons team!";

const FULL_STACK_REQUIREMENTS: &[&str] = &[
  "Waar zijn wij naar op zoek: ",
  "Geen 9-5 mentaliteit",
  "Duidelijk begrip van wat programmeren inhoudt",
  "Ervaring met...",
  "Zelfstandig",
  "Teamspeler",
  "Communicatief vaardig",
  "Wat ga je doen: ",
  "Programmeren",
  "DevOps",
  "Serverbeheer",
  "Infrastructuur",
  "Wat bieden wij: ",
  "Gezelligheid",
  "Uitdaging",
  "Een sterke basis voor je toekomst",
  "De nieuwste technieken",
];

#[cfg(test)]
mod tests {
  use talent_commonground::CommonGroundConfig;
  use talent_core::{Record, ResourceKind, store::ListQuery};
  use talent_store_sqlite::SqliteStore;

  use super::*;

  async fn store() -> SqliteStore { SqliteStore::open_in_memory().await.expect("in-memory store") }

  fn commonground() -> CommonGroundClient {
    CommonGroundClient::new(CommonGroundConfig::default()).unwrap()
  }

  #[test]
  fn domain_gating() {
    assert!(CONDUCTION.applies("zuid-drecht.nl", false));
    assert!(CONDUCTION.applies("dev.zuid-drecht.nl", false));
    assert!(CONDUCTION.applies("ZuidDrecht.NL", false));
    assert!(!CONDUCTION.applies("conduction.academy", false));
    assert!(!CONDUCTION.applies("notzuiddrecht.nl", false));
    assert!(!CONDUCTION.applies("", false));
    assert!(CONDUCTION.applies("example.com", true));

    assert!(STAGE.applies("conduction.academy", false));
    assert!(STAGE.applies("api.conduction.academy", false));
    assert!(!STAGE.applies("localhost", false));
  }

  #[test]
  fn fixture_ids_are_stable_per_set() {
    assert_eq!(fixture_id(&STAGE, "employee"), fixture_id(&STAGE, "employee"));
    assert_ne!(fixture_id(&STAGE, "employee"), fixture_id(&CONDUCTION, "employee"));
    assert_eq!(fixture_id(&STAGE, "employee").get_version_num(), 5);
  }

  #[tokio::test]
  async fn nothing_loads_on_a_foreign_domain() {
    let s = store().await;
    let reports = load_all(&s, &commonground(), "example.com", false).await.unwrap();
    assert!(reports.is_empty());
    assert!(!s.exists(ResourceKind::JobPosting, TEST_VACATURE).await.unwrap());
  }

  #[tokio::test]
  async fn conduction_domain_loads_the_test_vacature() {
    let s = store().await;
    let reports = load_all(&s, &commonground(), "zuiddrecht.nl", false).await.unwrap();
    assert_eq!(reports.len(), 2);

    let posting: Record<JobPosting> = s.get(TEST_VACATURE).await.unwrap().unwrap();
    assert_eq!(posting.name, "Test Vacature");
    assert_eq!(posting.job_location_type, "TELECOMMUTE");
    assert_eq!(posting.standard_hours, 40);
    assert_eq!(
      posting.hiring_organization.as_deref(),
      Some("https://cc.zaakonline.nl/organizations/9650a44d-d7d1-454a-ab4f-2338c90e8c2f")
    );
    assert!(posting.job_start_date < Utc::now() - Duration::weeks(6));
  }

  #[tokio::test]
  async fn academy_domain_loads_only_the_stage_set() {
    let s = store().await;
    let reports = load_all(&s, &commonground(), "conduction.academy", false).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].set, "stage");
    assert_eq!(reports[0].created, 7);

    let internship: Record<JobPosting> = s.get(FULL_STACK_DEVELOPER).await.unwrap().unwrap();
    assert_eq!(internship.employment_type, EmploymentType::Internship);
    assert_eq!(internship.job_location_type, "Amsterdam");
    assert_eq!(internship.education_requirements.len(), 17);
    assert_eq!(internship.base_salary, None);

    let skills: Vec<Record<Skill>> = s.list(&ListQuery::default()).await.unwrap();
    assert_eq!(skills.len(), 2);
    let competences: Vec<Record<Competence>> = s.list(&ListQuery::default()).await.unwrap();
    assert_eq!(competences.len(), 2);
    let employees: Vec<Record<Employee>> = s.list(&ListQuery::default()).await.unwrap();
    assert_eq!(employees[0].person, "https://cc.zaakonline.nl/people/d961291d-f5c1-46f4-8b4a-6abb41df88db");
  }

  #[tokio::test]
  async fn loading_twice_is_idempotent() {
    let s = store().await;
    let cg = commonground();
    load_all(&s, &cg, "", true).await.unwrap();
    let again = load_all(&s, &cg, "", true).await.unwrap();

    assert!(again.iter().all(|r| r.created == 0));
    let postings: Vec<Record<JobPosting>> = s.list(&ListQuery::default()).await.unwrap();
    assert_eq!(postings.len(), 2);
  }
}
