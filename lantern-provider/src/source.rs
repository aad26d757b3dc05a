//! Source resource
//!
//! `SourceProvider` reconciles `source` resources against a `SourceApi`. It
//! holds no logic of its own about variants: it hands the `parameters` block to
//! a `ParameterContainer`, asks the planner about replacement, and stores what
//! the remote returns.

use std::collections::HashMap;

use lantern_core::provider::{BoxFuture, Provider, ProviderError, ProviderResult, ResourceType};
use lantern_core::resource::{Resource, ResourceId, State, Value};
use lantern_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::api::{ApiError, SourceApi};
use crate::config::{StructuredBlock, get_structured_block};
use crate::container::ParameterContainer;
use crate::error::{ParameterError, ParameterResult};
use crate::parameters::{CommonFields, ResolvedParameters, VariantParameters};
use crate::planner::{ChangeImpact, EarlyResolution, PlannedChange, classify, plan_change};
use crate::registry::{VariantRegistry, registry};
use crate::wire::{WireObject, extract_discriminator};

pub const SOURCE_RESOURCE_TYPE: &str = "source";

/// Schema of the `source` resource, one optional `parameters` slot per variant
pub fn source_schema(registry: &VariantRegistry) -> ResourceSchema {
    let slots: Vec<AttributeSchema> = registry
        .descriptors()
        .map(|descriptor| {
            let schema = &descriptor.field_schema;
            let slot = AttributeSchema::new(descriptor.name, schema.as_object_type());
            match &schema.description {
                Some(description) => slot.with_description(description.clone()),
                None => slot,
            }
        })
        .collect();

    ResourceSchema::new(SOURCE_RESOURCE_TYPE)
        .with_description("A metadata source; exactly one parameters block selects its type")
        .attribute(AttributeSchema::new("id", AttributeType::String).computed())
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("description", AttributeType::String))
        .attribute(
            AttributeSchema::new("timezone", AttributeType::String)
                .with_description("IANA timezone of the source's schedule"),
        )
        .attribute(AttributeSchema::new("parameters", AttributeType::Object(slots)).required())
        .attribute(
            AttributeSchema::new("variant_name", AttributeType::String)
                .computed()
                .requires_replace()
                .with_description("Type of the source; changing it replaces the source"),
        )
}

pub struct SourceType;

impl ResourceType for SourceType {
    fn name(&self) -> &'static str {
        SOURCE_RESOURCE_TYPE
    }

    fn schema(&self) -> ResourceSchema {
        source_schema(registry())
    }
}

/// The `parameters` attribute as stored in state: only the active slot
pub fn canonical_parameters(parameters: &ResolvedParameters) -> Value {
    Value::Map(HashMap::from([(
        parameters.name().to_string(),
        parameters.to_config(),
    )]))
}

fn parameter_error(id: &ResourceId, error: ParameterError) -> ProviderError {
    ProviderError::from(error).for_resource(id.clone())
}

fn api_error(id: &ResourceId, error: ApiError) -> ProviderError {
    ProviderError::new(format!("API request failed: {}", error))
        .for_resource(id.clone())
        .with_cause(error)
}

/// Fields every source carries outside its parameters
struct SourceFields {
    name: String,
    description: Option<String>,
    timezone: Option<String>,
}

impl SourceFields {
    fn from_resource(resource: &Resource) -> ProviderResult<Self> {
        let id = &resource.id;
        let optional = |key: &str| match resource.attributes.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Unknown) => Err(ProviderError::new(format!(
                "'{}' is not known yet",
                key
            ))
            .for_resource(id.clone())),
            Some(other) => Err(ProviderError::new(format!(
                "'{}' must be a string, got {:?}",
                key, other
            ))
            .for_resource(id.clone())),
        };

        let name = optional("name")?.ok_or_else(|| {
            ProviderError::new("'name' is required").for_resource(id.clone())
        })?;
        Ok(Self {
            name,
            description: optional("description")?,
            timezone: optional("timezone")?,
        })
    }

    fn common(&self) -> CommonFields<'_> {
        CommonFields::new(&self.name, self.timezone.as_deref())
    }
}

/// Provider for `source` resources
pub struct SourceProvider<A> {
    api: A,
    registry: &'static VariantRegistry,
}

impl<A: SourceApi> SourceProvider<A> {
    pub fn new(api: A) -> Self {
        Self::with_registry(api, registry())
    }

    pub fn with_registry(api: A, registry: &'static VariantRegistry) -> Self {
        Self { api, registry }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn registry(&self) -> &'static VariantRegistry {
        self.registry
    }

    fn container_for(
        &self,
        attributes: &HashMap<String, Value>,
    ) -> ParameterResult<ParameterContainer<'static>> {
        match get_structured_block(attributes, "parameters") {
            StructuredBlock::Present(block) => ParameterContainer::from_config(self.registry, block),
            StructuredBlock::Unknown => {
                ParameterContainer::from_config(self.registry, &Value::Unknown)
            }
            StructuredBlock::Absent | StructuredBlock::Null => {
                Ok(ParameterContainer::empty(self.registry))
            }
        }
    }

    fn check_type(&self, id: &ResourceId) -> ProviderResult<()> {
        if id.resource_type == SOURCE_RESOURCE_TYPE {
            Ok(())
        } else {
            Err(ProviderError::new(format!(
                "Unknown resource type: {}",
                id.resource_type
            ))
            .for_resource(id.clone()))
        }
    }

    /// Plan-time diagnosis of a `parameters` block against a prior variant
    pub fn plan_source(
        &self,
        prior_variant: Option<&str>,
        parameters: &Value,
    ) -> ParameterResult<PlannedChange> {
        let container = ParameterContainer::from_config(self.registry, parameters)?;
        plan_change(prior_variant, &container)
    }

    /// Build the state of a source from the entity the remote returned
    fn state_from_response(&self, id: ResourceId, response: &WireObject) -> ProviderResult<State> {
        let identifier = response
            .id()
            .ok_or_else(|| ProviderError::new("Response has no id").for_resource(id.clone()))?
            .to_string();
        let discriminator = response.discriminator().ok_or_else(|| {
            ProviderError::new("Response has no source type").for_resource(id.clone())
        })?;

        let container =
            ParameterContainer::from_wire_response(self.registry, discriminator, response)
                .map_err(|e| parameter_error(&id, e))?;
        let Some(parameters) = container.active() else {
            return Err(parameter_error(
                &id,
                ParameterError::NoVariantSet {
                    valid: self.registry.valid_names(),
                },
            ));
        };

        let mut attributes = HashMap::new();
        attributes.insert("id".to_string(), Value::string(&identifier));
        for key in ["name", "description", "timezone"] {
            if let Some(value) = response.get(key).and_then(|v| v.as_str()) {
                attributes.insert(key.to_string(), Value::string(value));
            }
        }
        attributes.insert("parameters".to_string(), canonical_parameters(parameters));
        attributes.insert(
            "variant_name".to_string(),
            Value::string(parameters.name()),
        );

        Ok(State::existing(id, attributes).with_identifier(identifier))
    }

    pub async fn read_source(&self, id: ResourceId, identifier: Option<&str>) -> ProviderResult<State> {
        self.check_type(&id)?;
        let Some(identifier) = identifier else {
            return Ok(State::not_found(id));
        };

        let raw = match self.api.get_source(identifier).await {
            Ok(Some(raw)) => raw,
            Ok(None) | Err(ApiError::NotFound(_)) => return Ok(State::not_found(id)),
            Err(e) => return Err(api_error(&id, e)),
        };

        let discriminator = extract_discriminator(&raw).ok_or_else(|| {
            ProviderError::new("Remote source has no type").for_resource(id.clone())
        })?;
        log::debug!("read {} source {} ({})", discriminator, id, identifier);

        let response = WireObject::from_json(raw).ok_or_else(|| {
            ProviderError::new("Remote source is not a JSON object").for_resource(id.clone())
        })?;
        self.state_from_response(id, &response)
    }

    pub async fn create_source(&self, resource: Resource) -> ProviderResult<State> {
        self.check_type(&resource.id)?;
        let fields = SourceFields::from_resource(&resource)?;
        let mut container = self
            .container_for(&resource.attributes)
            .map_err(|e| parameter_error(&resource.id, e))?;

        let mut body = container
            .to_create_request(&fields.common())
            .map_err(|e| parameter_error(&resource.id, e))?;
        body.set_optional_field("description", fields.description.as_deref());

        log::info!(
            "creating {} source {}",
            container.active_variant_name().unwrap_or_default(),
            resource.id
        );
        let response = self
            .api
            .create_source(body)
            .await
            .map_err(|e| api_error(&resource.id, e))?;
        self.state_from_response(resource.id, &response)
    }

    pub async fn update_source(
        &self,
        id: ResourceId,
        identifier: &str,
        from: &State,
        to: Resource,
    ) -> ProviderResult<State> {
        self.check_type(&id)?;
        let fields = SourceFields::from_resource(&to)?;
        let mut container = self
            .container_for(&to.attributes)
            .map_err(|e| parameter_error(&id, e))?;
        let proposed = container
            .resolve_active()
            .map_err(|e| parameter_error(&id, e))?
            .name();

        // The differ cannot see a variant change that was unknown at plan time
        if let Some(prior) = from.attributes.get("variant_name").and_then(Value::as_str)
            && classify(Some(prior), proposed) == ChangeImpact::RequiresReplace
        {
            return Err(parameter_error(
                &id,
                ParameterError::VariantChange {
                    from: prior.to_string(),
                    to: proposed.to_string(),
                },
            ));
        }

        let mut body = container
            .to_update_request(&fields.common())
            .map_err(|e| parameter_error(&id, e))?;
        body.set_optional_field("description", fields.description.as_deref());

        log::info!("updating {} source {} ({})", proposed, id, identifier);
        let response = self
            .api
            .update_source(identifier, body)
            .await
            .map_err(|e| api_error(&id, e))?;
        self.state_from_response(id, &response)
    }

    pub async fn delete_source(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        self.check_type(id)?;
        log::info!("deleting source {} ({})", id, identifier);
        match self.api.delete_source(identifier).await {
            Ok(()) => Ok(()),
            Err(ApiError::NotFound(_)) => {
                log::warn!("{}: source {} was already deleted", id, identifier);
                Ok(())
            }
            Err(e) => Err(api_error(id, e)),
        }
    }
}

impl<A: SourceApi> Provider for SourceProvider<A> {
    fn name(&self) -> &'static str {
        "lantern"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        vec![Box::new(SourceType)]
    }

    /// Fill `variant_name` and normalise `parameters` before diffing
    ///
    /// When the variant choice is not known yet, `variant_name` becomes
    /// unknown and the plan goes ahead; `update` re-checks at apply time.
    fn modify_plan(&self, desired: &mut Resource, current: &State) -> ProviderResult<()> {
        if desired.id.resource_type != SOURCE_RESOURCE_TYPE {
            return Ok(());
        }

        let mut container = self
            .container_for(&desired.attributes)
            .map_err(|e| parameter_error(&desired.id, e))?;
        let prior = current
            .exists
            .then(|| current.attributes.get("variant_name").and_then(Value::as_str))
            .flatten();
        let planned = plan_change(prior, &container).map_err(|e| parameter_error(&desired.id, e))?;

        let name = match planned.variant {
            EarlyResolution::Resolved(name) => name,
            EarlyResolution::Deferred { slot } => {
                log::warn!(
                    "{}: source type depends on '{}', which is not known yet; \
                     replacement is decided at apply time",
                    desired.id,
                    slot
                );
                desired
                    .attributes
                    .insert("variant_name".to_string(), Value::Unknown);
                return Ok(());
            }
        };
        desired
            .attributes
            .insert("variant_name".to_string(), Value::string(name));
        if planned.impact == Some(ChangeImpact::RequiresReplace) {
            log::info!(
                "{}: source type changes from {} to {}; the source will be replaced",
                desired.id,
                prior.unwrap_or_default(),
                name
            );
        }

        // Field values still unknown are decoded at apply time
        let known = desired
            .attributes
            .get("parameters")
            .is_some_and(Value::is_wholly_known);
        if !known {
            return Ok(());
        }

        let parameters = container
            .resolve_active()
            .map_err(|e| parameter_error(&desired.id, e))?;
        let canonical = canonical_parameters(parameters);
        let accepts_timezone = parameters.accepts_timezone();
        desired
            .attributes
            .insert("parameters".to_string(), canonical);

        if !accepts_timezone
            && desired
                .attributes
                .get("timezone")
                .is_some_and(|tz| !tz.is_null())
        {
            log::warn!(
                "{}: {} sources have no timezone; 'timezone' is ignored",
                desired.id,
                name
            );
            desired.attributes.remove("timezone");
        }
        Ok(())
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move { self.read_source(id, identifier.as_deref()).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_source(resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move { self.update_source(id, &identifier, &from, to).await })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.delete_source(&id, &identifier).await })
    }
}
