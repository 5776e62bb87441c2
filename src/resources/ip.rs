//! `random_ip`: a random address inside a CIDR range.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::ProviderError;
use crate::random::ip::{self, AddressType, Cidr};
use crate::resource::{decode, encode, Resource};
use crate::schema::{Attribute, Diagnostic, Schema, Validator};

/// Resource type name.
pub const TYPE_NAME: &str = "random_ip";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct IpModel {
    id: Option<String>,
    address_type: Option<String>,
    cidr_range: Option<String>,
    keepers: Option<BTreeMap<String, Option<String>>>,
    result: Option<String>,
}

fn address_type(value: Option<&str>) -> Result<AddressType, ProviderError> {
    value
        .unwrap_or("ipv4")
        .parse()
        .map_err(ProviderError::Validation)
}

/// The `random_ip` resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIp;

impl Resource for RandomIp {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description(
                "The resource `random_ip` generates a random IP address from a given CIDR range.",
            )
            .with_attribute("keepers", Attribute::keepers())
            .with_attribute(
                "address_type",
                Attribute::optional_computed_string()
                    .with_default(json!("ipv4"))
                    .with_validator(Validator::OneOf {
                        values: vec!["ipv4".to_string(), "ipv6".to_string()],
                    })
                    .with_force_new()
                    .with_description("The address family, `ipv4` or `ipv6`. Defaults to `ipv4`."),
            )
            .with_attribute(
                "cidr_range",
                Attribute::optional_string()
                    .with_force_new()
                    .with_description(
                        "The CIDR range to draw the address from. Defaults to the whole address \
                         space of `address_type`.",
                    ),
            )
            .with_attribute(
                "result",
                Attribute::computed_string().with_description("The random IP address."),
            )
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("The random IP address."),
            )
    }

    fn validate_config(&self, config: &Value) -> Vec<Diagnostic> {
        let Some(range) = config.get("cidr_range").and_then(Value::as_str) else {
            return Vec::new();
        };
        let family = config
            .get("address_type")
            .and_then(Value::as_str)
            .unwrap_or("ipv4");
        // An unknown family is reported by the schema validator.
        let Ok(family) = family.parse::<AddressType>() else {
            return Vec::new();
        };
        match Cidr::parse(range, family) {
            Ok(_) => Vec::new(),
            Err(e) => vec![Diagnostic::error("Invalid Attribute Value")
                .with_detail(e.to_string())
                .with_attribute("cidr_range")],
        }
    }

    fn create(&self, planned: Value) -> Result<Value, ProviderError> {
        let mut model: IpModel = decode(planned)?;
        let family = address_type(model.address_type.as_deref())?;
        debug!(address_type = %family, "generating random_ip");

        let address = ip::random_address(family, model.cidr_range.as_deref())?.to_string();
        model.address_type = Some(family.to_string());
        model.id = Some(address.clone());
        model.result = Some(address);
        encode(&model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    fn planned(config: Value) -> Value {
        crate::plan::plan(&RandomIp, None, config.clone(), &config)
            .unwrap()
            .planned_state
    }

    #[test]
    fn test_create_default_ipv4() {
        let state = RandomIp.create(planned(json!({}))).unwrap();
        let addr: IpAddr = state["result"].as_str().unwrap().parse().unwrap();
        assert!(addr.is_ipv4());
        assert_eq!(state["address_type"], "ipv4");
        assert_eq!(state["id"], state["result"]);
    }

    #[test]
    fn test_create_in_range() {
        let config = json!({"cidr_range": "10.1.2.0/24"});
        for _ in 0..20 {
            let state = RandomIp.create(planned(config.clone())).unwrap();
            let result = state["result"].as_str().unwrap();
            assert!(result.starts_with("10.1.2."), "{result}");
        }
    }

    #[test]
    fn test_create_ipv6() {
        let config = json!({"address_type": "ipv6", "cidr_range": "fd00::/64"});
        let state = RandomIp.create(planned(config)).unwrap();
        let addr: IpAddr = state["result"].as_str().unwrap().parse().unwrap();
        let IpAddr::V6(v6) = addr else {
            panic!("expected ipv6, got {addr}");
        };
        assert_eq!(v6.segments()[..4], [0xfd00, 0, 0, 0]);
    }

    #[test]
    fn test_create_rejects_family_mismatch() {
        let config = json!({"address_type": "ipv6", "cidr_range": "10.0.0.0/8"});
        let err = RandomIp.create(planned(config)).unwrap_err();
        assert!(matches!(err, ProviderError::Random(_)));
    }

    #[test]
    fn test_validate_config() {
        let diags = RandomIp.validate_config(&json!({"cidr_range": "10.0.0.0/40"}));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].attribute.as_deref(), Some("cidr_range"));
        assert!(RandomIp
            .validate_config(&json!({"cidr_range": "10.0.0.0/8"}))
            .is_empty());
    }
}
