//! Per-type rules for resource update commands.
//!
//! Each supported resource type registers a [`ResourceValidator`] in a
//! [`ValidatorRegistry`]. The validator declares the field schema of the
//! type and decides how an edit lands in the working set; types without
//! special rules use [`GenericValidator`].

use std::{collections::BTreeMap, fmt, sync::Arc};

use super::{
    merger::WorkingSet,
    schema::{FieldKind, FieldSchema},
};
use crate::{
    error::{ConveyorError, Result},
    models::{Properties, PropertyValue, Resource},
};

pub const SECURITY_GROUP: &str = "OS::Neutron::SecurityGroup";
pub const PORT: &str = "OS::Neutron::Port";
pub const FLOATING_IP: &str = "OS::Neutron::FloatingIP";
pub const NET: &str = "OS::Neutron::Net";
pub const SUBNET: &str = "OS::Neutron::Subnet";
pub const ROUTER: &str = "OS::Neutron::Router";
pub const KEY_PAIR: &str = "OS::Nova::KeyPair";
pub const SERVER: &str = "OS::Nova::Server";
pub const VOLUME: &str = "OS::Cinder::Volume";
pub const VOLUME_TYPE: &str = "OS::Cinder::VolumeType";
pub const QOS: &str = "OS::Cinder::Qos";
pub const STACK: &str = "OS::Heat::Stack";

/// Rules applied to commands targeting one resource type.
pub trait ResourceValidator: Send + Sync {
    /// Type tag this validator is registered for.
    fn resource_type(&self) -> &str;

    /// Kinds of the fields commands may carry.
    fn schema(&self) -> &FieldSchema;

    /// Checks a resource about to be added.
    fn validate_add(&self, _index: usize, _resource: &Resource, _working: &WorkingSet<'_>) -> Result<()> {
        Ok(())
    }

    /// Applies the coerced `fields` of command `index` to resource `name`.
    ///
    /// Returns the name of the edited resource, which differs from `name`
    /// when the edit replaced the resource.
    fn apply_edit(
        &self,
        index: usize,
        name: &str,
        fields: Properties,
        working: &mut WorkingSet<'_>,
    ) -> Result<String> {
        apply_fields(index, name, fields, working)
    }
}

/// Writes `fields` into resource `name`: `id` sets the provider id, every
/// other field replaces the property of the same name.
pub fn apply_fields(
    index: usize,
    name: &str,
    fields: Properties,
    working: &mut WorkingSet<'_>,
) -> Result<String> {
    let resource = working.resource_mut(index, name)?;
    for (field, value) in fields {
        if field == "id" {
            match value {
                PropertyValue::String(id) => resource.id = id,
                _ => return Err(ConveyorError::update_rejected(index, "field 'id' must be a string")),
            }
        } else {
            resource.properties.insert(field, value);
        }
    }
    Ok(name.to_string())
}

/// Replaces resource `name` by the provider object `fields["id"]` when that
/// id differs from the current one, then applies the remaining fields.
fn adopt_then_apply(
    index: usize,
    resource_type: &str,
    name: &str,
    mut fields: Properties,
    working: &mut WorkingSet<'_>,
) -> Result<String> {
    let name = match fields.remove("id") {
        Some(PropertyValue::String(id)) => {
            let current = working.resource_mut(index, name)?;
            if current.id == id {
                name.to_string()
            } else {
                let extracted = working.extract(index, resource_type, &id)?;
                working.replace_resource(index, name, extracted)?
            }
        }
        Some(_) => return Err(ConveyorError::update_rejected(index, "field 'id' must be a string")),
        None => name.to_string(),
    };
    if fields.is_empty() {
        return Ok(name);
    }
    apply_fields(index, &name, fields, working)
}

/// Field edits with a typed schema and no further rules.
pub struct GenericValidator {
    resource_type: String,
    schema: FieldSchema,
}

impl GenericValidator {
    pub fn new(resource_type: impl Into<String>, schema: FieldSchema) -> Self {
        Self {
            resource_type: resource_type.into(),
            schema,
        }
    }
}

impl ResourceValidator for GenericValidator {
    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn schema(&self) -> &FieldSchema {
        &self.schema
    }
}

/// Types whose `id` names an external object: a new id swaps the resource
/// for the extracted object and redirects every pointer to it.
pub struct ReplacingValidator {
    resource_type: String,
    schema: FieldSchema,
}

impl ReplacingValidator {
    pub fn new(resource_type: impl Into<String>, schema: FieldSchema) -> Self {
        Self {
            resource_type: resource_type.into(),
            schema,
        }
    }
}

impl ResourceValidator for ReplacingValidator {
    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    fn apply_edit(
        &self,
        index: usize,
        name: &str,
        fields: Properties,
        working: &mut WorkingSet<'_>,
    ) -> Result<String> {
        adopt_then_apply(index, &self.resource_type, name, fields, working)
    }
}

/// Security groups are edited through a full `rules` list or adopted by
/// `id`.
pub struct SecurityGroupValidator {
    schema: FieldSchema,
}

impl Default for SecurityGroupValidator {
    fn default() -> Self {
        Self {
            schema: FieldSchema::new()
                .field("id", FieldKind::String)
                .field("name", FieldKind::String)
                .field("description", FieldKind::String)
                .field("rules", FieldKind::List),
        }
    }
}

impl SecurityGroupValidator {
    fn check_rules(index: usize, rules: &PropertyValue) -> Result<()> {
        let valid = rules
            .as_seq()
            .map(|items| items.iter().all(|rule| rule.as_map().is_some()))
            .unwrap_or(false);
        if valid {
            Ok(())
        } else {
            Err(ConveyorError::update_rejected(index, "security group rules must be a list of maps"))
        }
    }
}

impl ResourceValidator for SecurityGroupValidator {
    fn resource_type(&self) -> &str {
        SECURITY_GROUP
    }

    fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    fn validate_add(&self, index: usize, resource: &Resource, _working: &WorkingSet<'_>) -> Result<()> {
        match resource.properties.get("rules") {
            Some(rules) => Self::check_rules(index, rules),
            None => Ok(()),
        }
    }

    fn apply_edit(
        &self,
        index: usize,
        name: &str,
        fields: Properties,
        working: &mut WorkingSet<'_>,
    ) -> Result<String> {
        match fields.get("rules") {
            Some(rules) => Self::check_rules(index, rules)?,
            None if fields.contains_key("id") => {}
            None => {
                return Err(ConveyorError::update_rejected(
                    index,
                    "security group edit requires 'rules' or the 'id' of a group to adopt",
                ))
            }
        }
        adopt_then_apply(index, SECURITY_GROUP, name, fields, working)
    }
}

/// Ports keep the number of fixed IPs they were extracted with, and every
/// subnet they point at must be part of the plan.
pub struct PortValidator {
    schema: FieldSchema,
}

impl Default for PortValidator {
    fn default() -> Self {
        Self {
            schema: FieldSchema::new()
                .field("id", FieldKind::String)
                .field("name", FieldKind::String)
                .field("mac_address", FieldKind::String)
                .field("admin_state_up", FieldKind::Bool)
                .field("fixed_ips", FieldKind::List)
                .field("security_groups", FieldKind::List),
        }
    }
}

impl PortValidator {
    fn check_fixed_ips(
        index: usize,
        name: &str,
        fixed_ips: &[PropertyValue],
        working: &WorkingSet<'_>,
    ) -> Result<()> {
        let original_count = working
            .original()
            .get(name)
            .and_then(|port| port.properties.get("fixed_ips"))
            .and_then(PropertyValue::as_seq)
            .map(<[PropertyValue]>::len);
        if let Some(expected) = original_count {
            if expected != fixed_ips.len() {
                return Err(ConveyorError::update_rejected(
                    index,
                    format!(
                        "port '{name}' has {expected} fixed_ips, got {}",
                        fixed_ips.len()
                    ),
                ));
            }
        }

        for entry in fixed_ips {
            let subnet = entry
                .get("subnet_id")
                .and_then(PropertyValue::referenced_resource);
            if let Some(subnet) = subnet {
                if !working.contains(subnet) {
                    return Err(ConveyorError::update_rejected(
                        index,
                        format!("fixed_ips of port '{name}' reference unknown subnet '{subnet}'"),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl ResourceValidator for PortValidator {
    fn resource_type(&self) -> &str {
        PORT
    }

    fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    fn validate_add(&self, index: usize, resource: &Resource, working: &WorkingSet<'_>) -> Result<()> {
        match resource.properties.get("fixed_ips").and_then(PropertyValue::as_seq) {
            Some(fixed_ips) => Self::check_fixed_ips(index, &resource.name, fixed_ips, working),
            None => Ok(()),
        }
    }

    fn apply_edit(
        &self,
        index: usize,
        name: &str,
        fields: Properties,
        working: &mut WorkingSet<'_>,
    ) -> Result<String> {
        if let Some(fixed_ips) = fields.get("fixed_ips").and_then(PropertyValue::as_seq) {
            Self::check_fixed_ips(index, name, fixed_ips, working)?;
        }
        apply_fields(index, name, fields, working)
    }
}

/// Validators keyed by resource type.
#[derive(Clone)]
pub struct ValidatorRegistry {
    validators: BTreeMap<String, Arc<dyn ResourceValidator>>,
}

impl ValidatorRegistry {
    /// A registry that accepts no resource type.
    pub fn empty() -> Self {
        Self {
            validators: BTreeMap::new(),
        }
    }

    /// Registers `validator`, replacing any validator of the same type.
    pub fn register(mut self, validator: impl ResourceValidator + 'static) -> Self {
        self.validators
            .insert(validator.resource_type().to_string(), Arc::new(validator));
        self
    }

    pub fn get(&self, resource_type: &str) -> Option<&dyn ResourceValidator> {
        self.validators.get(resource_type).map(|validator| validator.as_ref())
    }

    /// Registered types, sorted.
    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.validators.keys().map(String::as_str)
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.resource_types()).finish()
    }
}

impl Default for ValidatorRegistry {
    /// Registry with the built-in rules of every supported type.
    fn default() -> Self {
        use FieldKind::*;

        Self::empty()
            .register(SecurityGroupValidator::default())
            .register(PortValidator::default())
            .register(ReplacingValidator::new(
                FLOATING_IP,
                FieldSchema::new()
                    .field("id", String)
                    .field("floating_ip_address", String)
                    .field("floating_network", Any)
                    .field("port_id", Any),
            ))
            .register(ReplacingValidator::new(
                NET,
                FieldSchema::new()
                    .field("id", String)
                    .field("name", String)
                    .field("admin_state_up", Bool)
                    .field("shared", Bool)
                    .field("value_specs", Map),
            ))
            .register(ReplacingValidator::new(
                KEY_PAIR,
                FieldSchema::new()
                    .field("id", String)
                    .field("name", String)
                    .field("public_key", String),
            ))
            .register(ReplacingValidator::new(
                VOLUME_TYPE,
                FieldSchema::new()
                    .field("id", String)
                    .field("name", String)
                    .field("is_public", Bool)
                    .field("metadata", Map),
            ))
            .register(GenericValidator::new(
                VOLUME,
                FieldSchema::new()
                    .field("id", String)
                    .field("name", String)
                    .field("description", String)
                    .field("size", Integer)
                    .field("metadata", Map)
                    .field("read_only", Bool)
                    .field("multiattach", Bool),
            ))
            .register(GenericValidator::new(
                SUBNET,
                FieldSchema::new()
                    .field("id", String)
                    .field("name", String)
                    .field("cidr", String)
                    .field("ip_version", Integer)
                    .field("enable_dhcp", Bool)
                    .field("allocation_pools", List)
                    .field("dns_nameservers", List)
                    .field("host_routes", List),
            ))
            .register(GenericValidator::new(
                SERVER,
                FieldSchema::new()
                    .field("id", String)
                    .field("name", String)
                    .field("flavor", String)
                    .field("availability_zone", String)
                    .field("metadata", Map)
                    .field("networks", List)
                    .field("user_data", String),
            ))
            .register(GenericValidator::new(
                QOS,
                FieldSchema::new()
                    .field("id", String)
                    .field("name", String)
                    .field("specs", Map),
            ))
            .register(GenericValidator::new(
                STACK,
                FieldSchema::new()
                    .field("id", String)
                    .field("parameters", Map)
                    .field("timeout", Integer)
                    .field("disable_rollback", Bool),
            ))
            .register(GenericValidator::new(
                ROUTER,
                FieldSchema::new()
                    .field("id", String)
                    .field("name", String)
                    .field("admin_state_up", Bool)
                    .field("external_gateway_info", Map),
            ))
    }
}
