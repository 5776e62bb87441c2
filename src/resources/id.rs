//! `random_id`: random bytes rendered in several encodings.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::ProviderError;
use crate::random;
use crate::resource::{count, decode, encode, Resource};
use crate::schema::{Attribute, Schema, Validator};

/// Resource type name.
pub const TYPE_NAME: &str = "random_id";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct IdModel {
    id: Option<String>,
    byte_length: Option<i64>,
    prefix: Option<String>,
    keepers: Option<BTreeMap<String, Option<String>>>,
    b64_url: Option<String>,
    b64_std: Option<String>,
    hex: Option<String>,
    dec: Option<String>,
}

impl IdModel {
    fn fill(&mut self, bytes: &[u8]) {
        let prefix = self.prefix.clone().unwrap_or_default();
        let id = URL_SAFE_NO_PAD.encode(bytes);
        self.b64_url = Some(format!("{prefix}{id}"));
        self.b64_std = Some(format!("{prefix}{}", STANDARD.encode(bytes)));
        self.hex = Some(format!("{prefix}{}", hex::encode(bytes)));
        self.dec = Some(format!("{prefix}{}", big_endian_decimal(bytes)));
        self.id = Some(id);
    }
}

/// Render `bytes` as an unsigned big-endian integer in base 10.
fn big_endian_decimal(bytes: &[u8]) -> String {
    // Little-endian base 10^9 limbs.
    const LIMB: u64 = 1_000_000_000;
    let mut limbs: Vec<u64> = vec![0];
    for byte in bytes {
        let mut carry = u64::from(*byte);
        for limb in limbs.iter_mut() {
            let v = *limb * 256 + carry;
            *limb = v % LIMB;
            carry = v / LIMB;
        }
        while carry > 0 {
            limbs.push(carry % LIMB);
            carry /= LIMB;
        }
    }

    let mut out = String::new();
    let mut iter = limbs.iter().rev();
    if let Some(first) = iter.next() {
        out.push_str(&first.to_string());
    }
    for limb in iter {
        out.push_str(&format!("{limb:09}"));
    }
    out
}

/// The `random_id` resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomId;

impl Resource for RandomId {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description(
                "The resource `random_id` generates random numbers that are intended to be used \
                 as unique identifiers for other resources.",
            )
            .with_attribute("keepers", Attribute::keepers())
            .with_attribute(
                "byte_length",
                Attribute::required_int64()
                    .with_force_new()
                    .with_validator(Validator::AtLeast { min: 1 })
                    .with_description(
                        "The number of random bytes to produce. The minimum value is 1.",
                    ),
            )
            .with_attribute(
                "prefix",
                Attribute::optional_string()
                    .with_force_new()
                    .with_description("Arbitrary string to prefix the output value with."),
            )
            .with_attribute(
                "id",
                Attribute::computed_string()
                    .with_description(
                        "The generated id presented in base64 without additional transformations.",
                    ),
            )
            .with_attribute(
                "b64_url",
                Attribute::computed_string()
                    .with_description(
                        "The generated id presented in base64, using the URL-friendly \
                         character set.",
                    ),
            )
            .with_attribute(
                "b64_std",
                Attribute::computed_string()
                    .with_description(
                        "The generated id presented in base64 without additional transformations.",
                    ),
            )
            .with_attribute(
                "hex",
                Attribute::computed_string()
                    .with_description("The generated id presented in padded hexadecimal digits."),
            )
            .with_attribute(
                "dec",
                Attribute::computed_string()
                    .with_description("The generated id presented in non-padded decimal digits."),
            )
    }

    fn create(&self, planned: Value) -> Result<Value, ProviderError> {
        let mut model: IdModel = decode(planned)?;
        let len = count("byte_length", model.byte_length)?;
        debug!(byte_length = len, "generating random_id");

        let bytes = random::secure_bytes(len)?;
        model.fill(&bytes);
        encode(&model)
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let (prefix, encoded) = match id.rsplit_once(',') {
            Some((prefix, encoded)) => (prefix, encoded),
            None => ("", id),
        };
        let bytes = URL_SAFE_NO_PAD.decode(encoded).map_err(|e| {
            ProviderError::Import(format!(
                "error decoding ID {:?}: expected \"<prefix>,<base64url>\" or \"<base64url>\": {}",
                id, e
            ))
        })?;

        let mut model = IdModel {
            byte_length: Some(bytes.len() as i64),
            prefix: (!prefix.is_empty()).then(|| prefix.to_string()),
            ..IdModel::default()
        };
        model.fill(&bytes);
        encode(&model)
    }
}
