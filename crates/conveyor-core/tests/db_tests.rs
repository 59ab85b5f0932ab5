use conveyor_core::{
    models::{DependencyMap, PlanFilter, PropertyValue, ResourceMap},
    store::StoredResources,
    ConveyorError, Database, Plan, PlanResources, PlanStatus, PlanType, Resource, View,
};
use jiff::{Timestamp, ToSpan};
use tempfile::NamedTempFile;

/// Helper function to create a temporary database for testing
fn create_test_db() -> (NamedTempFile, Database) {
    let temp_file = NamedTempFile::new().expect("Failed to create temporary file");
    let db = Database::new(temp_file.path()).expect("Failed to create test database");
    (temp_file, db)
}

fn sample_resources() -> ResourceMap {
    let mut resources = ResourceMap::new();
    resources.insert(
        "volume_0".to_string(),
        Resource::new("volume_0", "OS::Cinder::Volume").with_id("v-1"),
    );
    resources.insert(
        "server_0".to_string(),
        Resource::new("server_0", "OS::Nova::Server")
            .with_id("s-1")
            .with_property("block_device", PropertyValue::ResourceRef("volume_0".into())),
    );
    resources
}

fn sample_plan(plan_type: PlanType, project: &str) -> Plan {
    Plan::new(plan_type, project, "user", sample_resources())
}

#[test]
fn test_database_initialization() {
    let (temp_file, _db) = create_test_db();
    assert!(temp_file.path().exists());

    // Opening an initialized database again is fine
    Database::new(temp_file.path()).expect("Failed to reopen database");
}

#[test]
fn test_create_and_get_plan() {
    let (_temp_file, mut db) = create_test_db();
    let plan = sample_plan(PlanType::Clone, "project-a");
    db.create_plan(&plan).expect("Failed to create plan");

    let loaded = db
        .get_plan(&plan.plan_id)
        .expect("Failed to get plan")
        .expect("Plan should exist");
    assert_eq!(loaded, plan);
    assert_eq!(
        loaded.resources.dependencies(View::Original)["server_0"].dependencies,
        vec!["volume_0"]
    );
}

#[test]
fn test_duplicate_plan_id_is_rejected() {
    let (_temp_file, mut db) = create_test_db();
    let plan = sample_plan(PlanType::Clone, "project-a");
    db.create_plan(&plan).expect("Failed to create plan");

    let err = db.create_plan(&plan).unwrap_err();
    assert!(matches!(err, ConveyorError::Database { .. }));
}

#[test]
fn test_list_plans_filters() {
    let (_temp_file, mut db) = create_test_db();
    let clone_a = sample_plan(PlanType::Clone, "project-a");
    let migrate_a = sample_plan(PlanType::Migrate, "project-a");
    let mut clone_b = sample_plan(PlanType::Clone, "project-b");
    clone_b.plan_status = PlanStatus::Available;
    for plan in [&clone_a, &migrate_a, &clone_b] {
        db.create_plan(plan).expect("Failed to create plan");
    }

    assert_eq!(db.list_plans(None).expect("list").len(), 3);

    let filter = PlanFilter {
        project_id: Some("project-a".to_string()),
        plan_type: Some(PlanType::Migrate),
        ..Default::default()
    };
    let plans = db.list_plans(Some(&filter)).expect("list");
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].plan_id, migrate_a.plan_id);

    let plans = db
        .list_plans(Some(&PlanFilter::with_status(PlanStatus::Available)))
        .expect("list");
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].plan_id, clone_b.plan_id);
}

#[test]
fn test_list_plans_updated_before() {
    let (_temp_file, mut db) = create_test_db();
    let mut old = sample_plan(PlanType::Clone, "project-a");
    old.updated_at = Timestamp::now()
        .checked_sub(48.hours())
        .expect("timestamp in range");
    let recent = sample_plan(PlanType::Clone, "project-a");
    db.create_plan(&old).expect("Failed to create plan");
    db.create_plan(&recent).expect("Failed to create plan");

    let filter = PlanFilter {
        updated_before: Some(
            Timestamp::now()
                .checked_sub(24.hours())
                .expect("timestamp in range"),
        ),
        ..Default::default()
    };
    let plans = db.list_plans(Some(&filter)).expect("list");
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].plan_id, old.plan_id);
}

#[test]
fn test_update_plan_fields() {
    let (_temp_file, mut db) = create_test_db();
    let mut plan = sample_plan(PlanType::Migrate, "project-a");
    db.create_plan(&plan).expect("Failed to create plan");

    plan.plan_status = PlanStatus::Creating;
    plan.task_status = "extracting".to_string();
    plan.stack_id = Some("stack-1".to_string());
    plan.touch();
    db.update_plan_fields(&plan).expect("Failed to update plan");

    let loaded = db
        .get_plan(&plan.plan_id)
        .expect("Failed to get plan")
        .expect("Plan should exist");
    assert_eq!(loaded.plan_status, PlanStatus::Creating);
    assert_eq!(loaded.task_status, "extracting");
    assert_eq!(loaded.stack_id.as_deref(), Some("stack-1"));
    assert_eq!(loaded.updated_at, plan.updated_at);
}

#[test]
fn test_save_plan_resources_keeps_original_view() {
    let (_temp_file, mut db) = create_test_db();
    let mut plan = sample_plan(PlanType::Clone, "project-a");
    db.create_plan(&plan).expect("Failed to create plan");

    let mut resources = sample_resources();
    resources.remove("server_0");
    plan.resources
        .replace_view(View::Updated, resources)
        .expect("Failed to replace view");
    db.save_plan_resources(&plan)
        .expect("Failed to save resources");

    let loaded = db
        .get_plan(&plan.plan_id)
        .expect("Failed to get plan")
        .expect("Plan should exist");
    assert_eq!(loaded.updated_resources().len(), 1);
    assert_eq!(loaded.resources.dependencies(View::Updated).len(), 1);
    assert_eq!(loaded.original_resources().len(), 2);
}

#[test]
fn test_save_refuses_inconsistent_resources() {
    let (_temp_file, mut db) = create_test_db();
    let mut plan = sample_plan(PlanType::Clone, "project-a");
    db.create_plan(&plan).expect("Failed to create plan");

    plan.resources = PlanResources::from(StoredResources {
        original_resources: sample_resources(),
        original_dependencies: plan.resources.dependencies(View::Original).clone(),
        updated_resources: sample_resources(),
        updated_dependencies: DependencyMap::new(),
    });
    let err = db.save_plan_resources(&plan).unwrap_err();
    assert!(matches!(err, ConveyorError::Internal { .. }));
}

#[test]
fn test_soft_deleted_plans_are_hidden() {
    let (_temp_file, mut db) = create_test_db();
    let plan = sample_plan(PlanType::Clone, "project-a");
    db.create_plan(&plan).expect("Failed to create plan");
    db.soft_delete_plan(&plan.plan_id, Timestamp::now())
        .expect("Failed to delete plan");

    assert!(db.get_plan(&plan.plan_id).expect("query").is_none());
    assert!(matches!(
        db.save_plan_resources(&plan),
        Err(ConveyorError::PlanNotFound { .. })
    ));

    let filter = PlanFilter {
        include_deleted: true,
        ..Default::default()
    };
    let plans = db.list_plans(Some(&filter)).expect("list");
    assert_eq!(plans.len(), 1);
    assert!(plans[0].deleted);
}

#[test]
fn test_write_transactions_serialize_connections() {
    let (temp_file, mut db) = create_test_db();
    let plan = sample_plan(PlanType::Clone, "project-a");
    db.create_plan(&plan).expect("Failed to create plan");

    // Each writer reads the plan, waits, then writes back its own addition
    let writers: Vec<_> = ["qos_0", "qos_1"]
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let path = temp_file.path().to_path_buf();
            let plan_id = plan.plan_id.clone();
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(20 * i as u64));
                let mut db = Database::new(&path).expect("Failed to open database");
                db.write_transaction(|db| {
                    let mut plan = db.get_plan(&plan_id)?.expect("Plan should exist");
                    let mut resources = plan.updated_resources().clone();
                    resources.insert(name.to_string(), Resource::new(name, "OS::Cinder::Qos"));
                    std::thread::sleep(std::time::Duration::from_millis(100));
                    plan.resources.replace_view(View::Updated, resources)?;
                    db.save_plan_resources(&plan)
                })
                .expect("Failed to save plan");
            })
        })
        .collect();
    for writer in writers {
        writer.join().expect("writer panicked");
    }

    let loaded = db
        .get_plan(&plan.plan_id)
        .expect("Failed to get plan")
        .expect("Plan should exist");
    assert!(loaded.updated_resources().contains_key("qos_0"));
    assert!(loaded.updated_resources().contains_key("qos_1"));
}

#[test]
fn test_failed_write_transaction_rolls_back() {
    let (_temp_file, mut db) = create_test_db();
    let plan = sample_plan(PlanType::Clone, "project-a");
    db.create_plan(&plan).expect("Failed to create plan");

    let result: conveyor_core::Result<()> = db.write_transaction(|db| {
        let mut changed = plan.clone();
        changed.plan_status = PlanStatus::Available;
        db.update_plan_fields(&changed)?;
        Err(ConveyorError::internal("abort"))
    });
    assert!(result.is_err());

    let loaded = db
        .get_plan(&plan.plan_id)
        .expect("Failed to get plan")
        .expect("Plan should exist");
    assert_eq!(loaded.plan_status, PlanStatus::Initiating);
}
