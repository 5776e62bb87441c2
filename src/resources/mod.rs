//! The managed random resources.

pub mod bytes;
pub mod charset;
pub mod id;
pub mod integer;
pub mod ip;
pub mod password;
pub mod pet;
pub mod shuffle;
pub mod string;
pub mod uuid;

use crate::resource::Resource;

pub use bytes::RandomBytes;
pub use id::RandomId;
pub use integer::RandomInteger;
pub use ip::RandomIp;
pub use password::RandomPassword;
pub use pet::RandomPet;
pub use shuffle::RandomShuffle;
pub use string::RandomString;
pub use uuid::RandomUuid;

/// Every managed resource the provider serves.
pub fn all() -> Vec<Box<dyn Resource>> {
    vec![
        Box::new(RandomBytes),
        Box::new(RandomId),
        Box::new(RandomInteger),
        Box::new(RandomIp),
        Box::new(RandomPassword),
        Box::new(RandomPet),
        Box::new(RandomShuffle),
        Box::new(RandomString),
        Box::new(RandomUuid),
    ]
}
