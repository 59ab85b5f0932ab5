//! Applies validated command batches to the updated view of a plan.
//!
//! A batch is replayed against a [`WorkingSet`], a private copy of the
//! updated view. Commands see the effect of the commands before them. The
//! plan is only touched once every command has passed, so a rejected batch
//! leaves both resources and dependencies exactly as they were.

use log::{debug, info, warn};

use super::{
    command::UpdateCommand,
    validators::{ResourceValidator, ValidatorRegistry},
};
use crate::{
    error::{ConveyorError, Result},
    graph::{build_dependencies, dependents_of, pointer_targets},
    models::{Plan, Properties, PropertyValue, Resource, ResourceMap},
    provider::{ExtractedResource, ResourceExtractor},
    store::View,
};

/// Mutable copy of the updated view used while a batch is validated.
pub struct WorkingSet<'a> {
    original: &'a ResourceMap,
    resources: ResourceMap,
    extractor: Option<&'a dyn ResourceExtractor>,
    changes: Vec<String>,
}

impl<'a> WorkingSet<'a> {
    /// Starts from `resources`, with `original` as the frozen source view.
    pub fn new(
        original: &'a ResourceMap,
        resources: ResourceMap,
        extractor: Option<&'a dyn ResourceExtractor>,
    ) -> Self {
        Self {
            original,
            resources,
            extractor,
            changes: Vec::new(),
        }
    }

    /// The original view of the plan.
    pub fn original(&self) -> &ResourceMap {
        self.original
    }

    /// Current state of the working copy.
    pub fn resources(&self) -> &ResourceMap {
        &self.resources
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    /// Resource `name`, rejecting command `index` when it does not exist.
    pub fn resource_mut(&mut self, index: usize, name: &str) -> Result<&mut Resource> {
        self.resources
            .get_mut(name)
            .ok_or_else(|| ConveyorError::update_rejected(index, format!("unknown resource '{name}'")))
    }

    pub fn insert(&mut self, resource: Resource) {
        self.resources.insert(resource.name.clone(), resource);
    }

    pub fn remove(&mut self, name: &str) -> Option<Resource> {
        self.resources.remove(name)
    }

    /// Asks the provider boundary for the object `provider_id`.
    pub fn extract(
        &self,
        index: usize,
        resource_type: &str,
        provider_id: &str,
    ) -> Result<ExtractedResource> {
        let extractor = self.extractor.ok_or_else(|| {
            ConveyorError::external(format!(
                "command {index} needs {resource_type} '{provider_id}' but no resource extractor is configured"
            ))
        })?;
        debug!("Extracting {resource_type} '{provider_id}' for command {index}");
        extractor.extract(resource_type, provider_id)
    }

    /// Swaps resource `old` for freshly extracted resources.
    ///
    /// The extracted resources are added, `old` is removed and every pointer
    /// to `old` is rewritten to the primary extracted resource. Resources the
    /// extraction returns that already exist are left as they are. Every
    /// resource added or rewritten must point only at resources of the
    /// working set. Returns the name of the resource now standing in for
    /// `old`.
    pub fn replace_resource(
        &mut self,
        index: usize,
        old: &str,
        extracted: ExtractedResource,
    ) -> Result<String> {
        let (primary, extras) = extracted.into_primary()?;
        let new = primary.name.clone();
        if new != old && self.contains(&new) {
            return Err(ConveyorError::update_rejected(
                index,
                format!("resource '{new}' already exists"),
            ));
        }

        self.remove(old);
        self.insert(primary);
        let mut touched = vec![new.clone()];
        for (name, resource) in extras {
            if !self.contains(&name) {
                touched.push(name.clone());
                self.resources.insert(name, resource);
            }
        }

        if new != old {
            for (name, resource) in &mut self.resources {
                if resource.rename_references(old, &new) > 0 && !touched.contains(name) {
                    touched.push(name.clone());
                }
            }
            debug!("Redirected references from '{old}' to '{new}'");
        }
        for name in &touched {
            if let Some(resource) = self.get(name) {
                check_pointers(index, resource, self)?;
            }
        }
        self.record(format!("replaced `{old}` with `{new}`"));
        Ok(new)
    }

    /// Notes a change for the result summary.
    pub fn record(&mut self, change: impl Into<String>) {
        self.changes.push(change.into());
    }

    fn finish(self) -> (ResourceMap, Vec<String>) {
        (self.resources, self.changes)
    }
}

/// Collaborators consulted while applying a batch.
#[derive(Clone, Copy)]
pub struct UpdateContext<'a> {
    pub registry: &'a ValidatorRegistry,
    pub extractor: Option<&'a dyn ResourceExtractor>,
}

impl<'a> UpdateContext<'a> {
    pub fn new(registry: &'a ValidatorRegistry) -> Self {
        Self {
            registry,
            extractor: None,
        }
    }

    pub fn with_extractor(mut self, extractor: &'a dyn ResourceExtractor) -> Self {
        self.extractor = Some(extractor);
        self
    }
}

/// Applies `commands` to the updated view of `plan`, all or nothing.
///
/// The plan status is checked before any command is looked at. On success
/// the updated view is replaced once and the list of applied changes is
/// returned; on failure `plan` is left untouched.
pub fn apply_updates(
    plan: &mut Plan,
    commands: &[UpdateCommand],
    context: &UpdateContext<'_>,
) -> Result<Vec<String>> {
    if !plan.plan_status.is_updatable() {
        return Err(ConveyorError::PlanNotUpdatable {
            id: plan.plan_id.clone(),
            status: plan.plan_status,
        });
    }

    let (resources, changes) = {
        let mut working = WorkingSet::new(
            plan.resources.resources(View::Original),
            plan.resources.resources(View::Updated).clone(),
            context.extractor,
        );
        for (index, command) in commands.iter().enumerate() {
            if let Err(e) = apply_command(index, command, context.registry, &mut working) {
                warn!("Rejected update batch for plan {}: {e}", plan.plan_id);
                return Err(e);
            }
            debug!(
                "Validated command {index} ({} '{}')",
                command.action(),
                command.resource_id()
            );
        }
        working.finish()
    };

    plan.resources.replace_view(View::Updated, resources)?;
    plan.touch();
    info!(
        "Applied {} update commands to plan {}",
        commands.len(),
        plan.plan_id
    );
    Ok(changes)
}

fn apply_command(
    index: usize,
    command: &UpdateCommand,
    registry: &ValidatorRegistry,
    working: &mut WorkingSet<'_>,
) -> Result<()> {
    match command {
        UpdateCommand::Add {
            resource_id,
            resource_type,
            fields,
        } => {
            if working.contains(resource_id) {
                return Err(ConveyorError::update_rejected(
                    index,
                    format!("resource '{resource_id}' already exists"),
                ));
            }
            let validator = lookup(index, registry, resource_type)?;
            let properties = validator.schema().coerce_all(index, fields)?;
            let resource = new_resource(index, resource_id, resource_type, properties)?;
            validator.validate_add(index, &resource, working)?;
            check_pointers(index, &resource, working)?;
            working.insert(resource);
            working.record(format!("added `{resource_id}`"));
            Ok(())
        }
        UpdateCommand::Edit {
            resource_id,
            resource_type,
            fields,
        } => {
            if fields.is_empty() {
                return Err(ConveyorError::update_rejected(index, "edit changes no fields"));
            }
            let existing_type = working
                .get(resource_id)
                .map(|resource| resource.resource_type.clone())
                .ok_or_else(|| {
                    ConveyorError::update_rejected(index, format!("unknown resource '{resource_id}'"))
                })?;
            if let Some(requested) = resource_type {
                if *requested != existing_type {
                    return Err(ConveyorError::update_rejected(
                        index,
                        format!("resource '{resource_id}' is a {existing_type}, not a {requested}"),
                    ));
                }
            }
            let validator = lookup(index, registry, &existing_type)?;
            let properties = validator.schema().coerce_all(index, fields)?;
            let name = validator.apply_edit(index, resource_id, properties, working)?;
            if let Some(resource) = working.get(&name) {
                check_pointers(index, resource, working)?;
            }
            working.record(format!("edited `{name}`"));
            Ok(())
        }
        UpdateCommand::Delete { resource_id } => {
            if !working.contains(resource_id) {
                return Err(ConveyorError::update_rejected(
                    index,
                    format!("unknown resource '{resource_id}'"),
                ));
            }
            let dependents = dependents_of(resource_id, &build_dependencies(working.resources()));
            if !dependents.is_empty() {
                return Err(ConveyorError::ResourceHasDependents {
                    name: resource_id.clone(),
                    dependents,
                });
            }
            working.remove(resource_id);
            working.record(format!("deleted `{resource_id}`"));
            Ok(())
        }
    }
}

fn lookup<'r>(
    index: usize,
    registry: &'r ValidatorRegistry,
    resource_type: &str,
) -> Result<&'r dyn ResourceValidator> {
    registry.get(resource_type).ok_or_else(|| {
        ConveyorError::update_rejected(index, format!("unsupported resource type '{resource_type}'"))
    })
}

fn new_resource(
    index: usize,
    name: &str,
    resource_type: &str,
    mut properties: Properties,
) -> Result<Resource> {
    let mut resource = Resource::new(name, resource_type);
    match properties.remove("id") {
        Some(PropertyValue::String(id)) => resource.id = id,
        Some(_) => return Err(ConveyorError::update_rejected(index, "field 'id' must be a string")),
        None => {}
    }
    resource.properties = properties;
    Ok(resource)
}

/// Rejects resources pointing at names absent from the working set.
fn check_pointers(index: usize, resource: &Resource, working: &WorkingSet<'_>) -> Result<()> {
    for value in resource.properties.values() {
        if let Some(missing) = pointer_targets(value)
            .into_iter()
            .find(|target| !working.contains(target))
        {
            return Err(ConveyorError::update_rejected(
                index,
                format!("resource '{}' references unknown resource '{missing}'", resource.name),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        error::ErrorKind,
        models::{PlanStatus, PlanType},
        provider::InMemoryExtractor,
    };

    fn resources(doc: serde_json::Value) -> ResourceMap {
        serde_json::from_value(doc).expect("Failed to decode resources")
    }

    fn sample_plan(status: PlanStatus) -> Plan {
        let mut plan = Plan::new(
            PlanType::Clone,
            "project",
            "user",
            resources(json!({
                "volume_0": {"name": "volume_0", "type": "OS::Cinder::Volume", "id": "v-1",
                             "properties": {"size": 10}},
                "server_0": {"name": "server_0", "type": "OS::Nova::Server", "id": "s-1",
                             "properties": {"block_device": {"get_resource": "volume_0"}}},
                "net_0": {"name": "net_0", "type": "OS::Neutron::Net", "id": "n-1"},
                "subnet_0": {"name": "subnet_0", "type": "OS::Neutron::Subnet",
                             "properties": {"network_id": {"get_resource": "net_0"}}},
                "subnet_1": {"name": "subnet_1", "type": "OS::Neutron::Subnet",
                             "properties": {"network_id": {"get_resource": "net_0"}}},
                "port_0": {"name": "port_0", "type": "OS::Neutron::Port",
                           "properties": {"fixed_ips": [
                               {"subnet_id": {"get_resource": "subnet_0"}},
                               {"subnet_id": {"get_resource": "subnet_1"}}
                           ]}},
                "fip_0": {"name": "fip_0", "type": "OS::Neutron::FloatingIP", "id": "f-1"},
                "assoc_0": {"name": "assoc_0", "type": "OS::Neutron::FloatingIPAssociation",
                            "properties": {"floatingip_id": {"get_resource": "fip_0"},
                                           "port_id": {"get_resource": "port_0"}}},
                "sg_0": {"name": "sg_0", "type": "OS::Neutron::SecurityGroup", "id": "g-1",
                         "properties": {"rules": []}}
            })),
        );
        plan.plan_status = status;
        plan
    }

    fn apply(plan: &mut Plan, batch: serde_json::Value) -> Result<Vec<String>> {
        let commands = UpdateCommand::parse_batch(&batch)?;
        let registry = ValidatorRegistry::default();
        apply_updates(plan, &commands, &UpdateContext::new(&registry))
    }

    fn apply_with(
        plan: &mut Plan,
        extractor: &InMemoryExtractor,
        batch: serde_json::Value,
    ) -> Result<Vec<String>> {
        let commands = UpdateCommand::parse_batch(&batch)?;
        let registry = ValidatorRegistry::default();
        let context = UpdateContext::new(&registry).with_extractor(extractor);
        apply_updates(plan, &commands, &context)
    }

    fn assert_no_dangling_pointers(plan: &Plan) {
        let resources = plan.updated_resources();
        for (name, resource) in resources {
            assert_eq!(&resource.name, name);
            for value in resource.properties.values() {
                for target in pointer_targets(value) {
                    assert!(
                        resources.contains_key(target),
                        "{name} points at missing {target}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_add_resource() {
        let mut plan = sample_plan(PlanStatus::Available);
        let changes = apply(
            &mut plan,
            json!([{"action": "add", "resource_id": "qos-01", "resource_type": "OS::Cinder::Qos"}]),
        )
        .expect("Failed to add resource");

        assert_eq!(changes, vec!["added `qos-01`"]);
        let (resources, dependencies) = plan.resources.get_view(View::Updated);
        assert!(resources.contains_key("qos-01"));
        assert!(dependencies["qos-01"].dependencies.is_empty());
        assert!(!plan.original_resources().contains_key("qos-01"));
    }

    #[test]
    fn test_add_then_edit_in_one_batch() {
        let mut plan = sample_plan(PlanStatus::Initiating);
        apply(
            &mut plan,
            json!([
                {"action": "add", "resource_id": "volume_1", "resource_type": "OS::Cinder::Volume",
                 "size": "5"},
                {"action": "edit", "resource_id": "volume_1", "size": "20", "multiattach": "false"}
            ]),
        )
        .expect("Failed to apply batch");

        let volume = &plan.updated_resources()["volume_1"];
        assert_eq!(volume.properties["size"], PropertyValue::Number(20.into()));
        assert_eq!(volume.properties["multiattach"], PropertyValue::Bool(false));
    }

    #[test]
    fn test_delete_blocked_by_dependent() {
        let mut plan = sample_plan(PlanStatus::Available);
        let before = plan.resources.clone();

        let err = apply(&mut plan, json!([{"action": "delete", "resource_id": "volume_0"}]))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.to_string().contains("server_0"));
        assert_eq!(plan.resources, before);
    }

    #[test]
    fn test_delete_unreferenced_resource() {
        let mut plan = sample_plan(PlanStatus::Available);
        apply(
            &mut plan,
            json!([
                {"action": "delete", "resource_id": "server_0"},
                {"action": "delete", "resource_id": "volume_0"}
            ]),
        )
        .expect("Failed to delete");

        let (resources, dependencies) = plan.resources.get_view(View::Updated);
        assert!(!resources.contains_key("volume_0"));
        assert!(!dependencies.contains_key("volume_0"));
        assert!(!dependencies.contains_key("server_0"));
    }

    #[test]
    fn test_failed_batch_changes_nothing() {
        let mut plan = sample_plan(PlanStatus::Available);
        let before = plan.resources.clone();
        let updated_at = plan.updated_at;

        let err = apply(
            &mut plan,
            json!([
                {"action": "add", "resource_id": "qos-01", "resource_type": "OS::Cinder::Qos"},
                {"action": "edit", "resource_id": "missing_0", "name": "x"},
                {"action": "delete", "resource_id": "server_0"}
            ]),
        )
        .unwrap_err();

        match err {
            ConveyorError::PlanResourcesUpdateError { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(plan.resources, before);
        assert_eq!(plan.updated_at, updated_at);
    }

    #[test]
    fn test_port_fixed_ips_cardinality() {
        let mut plan = sample_plan(PlanStatus::Available);
        let err = apply(
            &mut plan,
            json!([{"action": "edit", "resource_type": "OS::Neutron::Port", "resource_id": "port_0",
                    "fixed_ips": [{"subnet_id": {"get_resource": "subnet_0"}}]}]),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("fixed_ips"));
    }

    #[test]
    fn test_port_fixed_ips_need_known_subnets() {
        let mut plan = sample_plan(PlanStatus::Available);
        let err = apply(
            &mut plan,
            json!([{"action": "edit", "resource_id": "port_0",
                    "fixed_ips": "[{\"subnet_id\": {\"get_resource\": \"subnet_0\"}}, {\"subnet_id\": {\"get_resource\": \"subnet_9\"}}]"}]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("subnet_9"));

        apply(
            &mut plan,
            json!([{"action": "edit", "resource_id": "port_0",
                    "fixed_ips": [{"subnet_id": {"get_resource": "subnet_1"}, "ip_address": "10.0.0.5"},
                                  {"subnet_id": {"get_resource": "subnet_0"}}]}]),
        )
        .expect("Failed to edit port");
    }

    #[test]
    fn test_status_checked_before_commands() {
        let mut plan = sample_plan(PlanStatus::Cloning);
        // The command itself is malformed; the status still wins
        let err = apply(&mut plan, json!([{"action": "edit", "resource_id": "missing_0"}]))
            .unwrap_err();
        assert!(matches!(err, ConveyorError::PlanNotUpdatable { .. }));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_floating_ip_replacement_rewrites_references() {
        let mut plan = sample_plan(PlanStatus::Available);
        let extractor = InMemoryExtractor::new().with(
            "OS::Neutron::FloatingIP",
            "f-2",
            ExtractedResource {
                name: "fip_0_new".into(),
                resources: resources(json!({
                    "fip_0_new": {"name": "fip_0_new", "type": "OS::Neutron::FloatingIP", "id": "f-2",
                                  "properties": {"floating_ip_address": "203.0.113.7"}}
                })),
            },
        );
        let registry = ValidatorRegistry::default();
        let context = UpdateContext::new(&registry).with_extractor(&extractor);
        let commands = UpdateCommand::parse_batch(&json!([
            {"action": "edit", "resource_type": "OS::Neutron::FloatingIP", "resource_id": "fip_0", "id": "f-2"}
        ]))
        .expect("Failed to parse");

        apply_updates(&mut plan, &commands, &context).expect("Failed to replace floating ip");

        let (resources, dependencies) = plan.resources.get_view(View::Updated);
        assert!(!resources.contains_key("fip_0"));
        assert_eq!(resources["fip_0_new"].id, "f-2");
        assert_eq!(
            dependencies["assoc_0"].dependencies,
            vec!["fip_0_new", "port_0"]
        );
        assert!(plan.original_resources().contains_key("fip_0"));
    }

    #[test]
    fn test_extraction_failure_aborts_batch() {
        let mut plan = sample_plan(PlanStatus::Available);
        let before = plan.resources.clone();
        let extractor = InMemoryExtractor::new();
        let registry = ValidatorRegistry::default();
        let context = UpdateContext::new(&registry).with_extractor(&extractor);
        let commands = UpdateCommand::parse_batch(&json!([
            {"action": "add", "resource_id": "qos-01", "resource_type": "OS::Cinder::Qos"},
            {"action": "edit", "resource_id": "net_0", "id": "n-404"}
        ]))
        .expect("Failed to parse");

        let err = apply_updates(&mut plan, &commands, &context).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalFailure);
        assert_eq!(plan.resources, before);
    }

    #[test]
    fn test_security_group_edit_needs_rules_or_id() {
        let mut plan = sample_plan(PlanStatus::Available);
        let err = apply(
            &mut plan,
            json!([{"action": "edit", "resource_id": "sg_0", "description": "web"}]),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        apply(
            &mut plan,
            json!([{"action": "edit", "resource_id": "sg_0",
                    "rules": "[{\"protocol\": \"tcp\", \"port_range_min\": 22}]"}]),
        )
        .expect("Failed to edit rules");
        let rules = plan.updated_resources()["sg_0"].properties["rules"].clone();
        assert_eq!(serde_json::Value::from(rules), json!([{"protocol": "tcp", "port_range_min": 22}]));
    }

    #[test]
    fn test_rejects_unknown_type_and_dangling_pointer() {
        let mut plan = sample_plan(PlanStatus::Available);
        let err = apply(
            &mut plan,
            json!([{"action": "add", "resource_id": "lb_0", "resource_type": "OS::Octavia::LoadBalancer"}]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("unsupported resource type"));

        let err = apply(
            &mut plan,
            json!([{"action": "edit", "resource_id": "server_0",
                    "block_device": {"get_resource": "volume_9"}}]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("volume_9"));
    }

    #[test]
    fn test_replacement_keys_primary_by_extraction_name() {
        let mut plan = sample_plan(PlanStatus::Available);
        let extractor = InMemoryExtractor::new().with(
            "OS::Neutron::FloatingIP",
            "f-2",
            ExtractedResource {
                name: "fip_0_new".into(),
                resources: resources(json!({
                    "fip_0_new": {"name": "floatingip_f2", "type": "OS::Neutron::FloatingIP", "id": "f-2"}
                })),
            },
        );

        apply_with(
            &mut plan,
            &extractor,
            json!([{"action": "edit", "resource_id": "fip_0", "id": "f-2"}]),
        )
        .expect("Failed to replace floating ip");

        let (resources, dependencies) = plan.resources.get_view(View::Updated);
        assert!(resources.contains_key("fip_0_new"));
        assert!(!resources.contains_key("floatingip_f2"));
        assert_eq!(
            dependencies["assoc_0"].dependencies,
            vec!["fip_0_new", "port_0"]
        );
        assert_no_dangling_pointers(&plan);
    }

    #[test]
    fn test_security_group_adopted_by_id() {
        let mut plan = sample_plan(PlanStatus::Available);
        let extractor = InMemoryExtractor::new().with(
            "OS::Neutron::SecurityGroup",
            "g-2",
            ExtractedResource {
                name: "sg_1".into(),
                resources: resources(json!({
                    "sg_1": {"name": "sg_1", "type": "OS::Neutron::SecurityGroup", "id": "g-2",
                             "properties": {"rules": [{"protocol": "tcp", "port_range_min": 443}]}}
                })),
            },
        );

        let changes = apply_with(
            &mut plan,
            &extractor,
            json!([
                {"action": "edit", "resource_id": "port_0",
                 "security_groups": [{"get_resource": "sg_0"}]},
                {"action": "edit", "resource_id": "sg_0", "id": "g-2"}
            ]),
        )
        .expect("Failed to adopt security group");

        assert!(changes.contains(&"replaced `sg_0` with `sg_1`".to_string()));
        let (resources, dependencies) = plan.resources.get_view(View::Updated);
        assert!(!resources.contains_key("sg_0"));
        assert_eq!(resources["sg_1"].id, "g-2");
        assert!(dependencies["port_0"].dependencies.contains(&"sg_1".to_string()));
        assert_no_dangling_pointers(&plan);
    }

    #[test]
    fn test_net_replacement_brings_subnets() {
        let mut plan = sample_plan(PlanStatus::Available);
        let extractor = InMemoryExtractor::new().with(
            "OS::Neutron::Net",
            "n-2",
            ExtractedResource {
                name: "net_1".into(),
                resources: resources(json!({
                    "net_1": {"name": "net_1", "type": "OS::Neutron::Net", "id": "n-2"},
                    "subnet_0": {"name": "subnet_0", "type": "OS::Neutron::Subnet",
                                 "properties": {"cidr": "10.9.0.0/24",
                                                "network_id": {"get_resource": "net_1"}}},
                    "subnet_5": {"name": "subnet_5", "type": "OS::Neutron::Subnet",
                                 "properties": {"network_id": {"get_resource": "net_1"}}}
                })),
            },
        );

        apply_with(
            &mut plan,
            &extractor,
            json!([{"action": "edit", "resource_id": "net_0", "id": "n-2"}]),
        )
        .expect("Failed to replace network");

        let (resources, dependencies) = plan.resources.get_view(View::Updated);
        assert!(!resources.contains_key("net_0"));
        assert!(resources.contains_key("subnet_5"));
        // The existing subnet is kept and only redirected
        assert!(!resources["subnet_0"].properties.contains_key("cidr"));
        for subnet in ["subnet_0", "subnet_1", "subnet_5"] {
            assert_eq!(dependencies[subnet].dependencies, vec!["net_1"]);
        }
        assert_no_dangling_pointers(&plan);
    }

    #[test]
    fn test_replacement_with_dangling_extra_is_rejected() {
        let mut plan = sample_plan(PlanStatus::Available);
        let before = plan.resources.clone();
        let extractor = InMemoryExtractor::new().with(
            "OS::Neutron::Net",
            "n-3",
            ExtractedResource {
                name: "net_2".into(),
                resources: resources(json!({
                    "net_2": {"name": "net_2", "type": "OS::Neutron::Net", "id": "n-3"},
                    "subnet_7": {"name": "subnet_7", "type": "OS::Neutron::Subnet",
                                 "properties": {"network_id": {"get_resource": "net_9"}}}
                })),
            },
        );

        let err = apply_with(
            &mut plan,
            &extractor,
            json!([{"action": "edit", "resource_id": "net_0", "id": "n-3"}]),
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("net_9"));
        assert_eq!(plan.resources, before);
    }
}
