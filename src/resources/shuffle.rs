//! `random_shuffle`: a random permutation of a list of strings.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::ProviderError;
use crate::random;
use crate::resource::{count, decode, encode, Resource};
use crate::schema::{Attribute, Schema, Validator};

/// Resource type name.
pub const TYPE_NAME: &str = "random_shuffle";

/// `id` of every shuffle resource.
pub const SHUFFLE_ID: &str = "-";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ShuffleModel {
    id: Option<String>,
    input: Option<Vec<String>>,
    seed: Option<String>,
    result_count: Option<i64>,
    keepers: Option<BTreeMap<String, Option<String>>>,
    result: Option<Vec<String>>,
}

/// Draw `k` items from successive permutations of `input`.
fn shuffled<R: Rng + ?Sized>(rng: &mut R, input: &[String], k: usize) -> Vec<String> {
    let mut result = Vec::with_capacity(k);
    if input.is_empty() {
        return result;
    }
    while result.len() < k {
        let take = (k - result.len()).min(input.len());
        let mut pool = input.to_vec();
        let (picked, _) = pool.partial_shuffle(rng, take);
        result.extend_from_slice(picked);
    }
    result
}

/// The `random_shuffle` resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomShuffle;

impl Resource for RandomShuffle {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description(
                "The resource `random_shuffle` generates a random permutation of a list of strings \
                 given as an argument.",
            )
            .with_attribute("keepers", Attribute::keepers())
            .with_attribute(
                "input",
                Attribute::required_string_list()
                    .with_force_new()
                    .with_description("The list of strings to shuffle."),
            )
            .with_attribute(
                "seed",
                Attribute::optional_string()
                    .with_force_new()
                    .with_description(
                        "Arbitrary string with which to seed the random number generator, in order \
                         to produce less-volatile permutations of the list.",
                    ),
            )
            .with_attribute(
                "result_count",
                Attribute::optional_int64()
                    .with_force_new()
                    .with_validator(Validator::AtLeast { min: 0 })
                    .with_description(
                        "The number of results to return. Defaults to the number of items in \
                         the `input` list. If fewer items are requested, some elements will be \
                         excluded from the result. If more items are requested, items will be \
                         repeated in the result but not more frequently than the number of items \
                         in the input list.",
                    ),
            )
            .with_attribute(
                "result",
                Attribute::computed_string_list()
                    .with_description(
                        "Random permutation of the list of strings given in `input`.",
                    ),
            )
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("A static value used internally."),
            )
    }

    fn create(&self, planned: Value) -> Result<Value, ProviderError> {
        let mut model: ShuffleModel = decode(planned)?;
        let input = model.input.clone().unwrap_or_default();
        let k = match model.result_count {
            Some(n) if n != 0 => count("result_count", Some(n))?,
            _ => input.len(),
        };
        debug!(input_len = input.len(), result_count = k, "generating random_shuffle");

        let mut rng = random::seeded_rng(model.seed.as_deref())?;
        model.result = Some(shuffled(&mut rng, &input, k));
        model.id = Some(SHUFFLE_ID.to_string());
        encode(&model)
    }
}
