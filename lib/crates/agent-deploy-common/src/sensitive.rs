// lib/crates/agent-deploy-common/src/sensitive.rs

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Key the orchestration engine uses to recognise a secret envelope.
pub const SECRET_SIG_KEY: &str = "4dabf18193072939515e22adb298388d";
/// Value paired with [`SECRET_SIG_KEY`] in a secret envelope.
pub const SECRET_SIG_VALUE: &str = "1b47061264138c4ac30d75fd1eb44270";

/// A value that must never reach logs or plaintext resource fields.
///
/// `Debug` and `Display` print a fixed placeholder. `Serialize` is
/// transparent so the value can populate a secret-store resource such as
/// `Secret.stringData`; fields outside a secret store must use
/// [`secret_envelope`] instead.
#[derive(Clone, PartialEq, Eq)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the wrapped value. Call sites are the only places the
    /// plaintext is visible, so keep them few.
    #[must_use]
    pub fn expose(&self) -> &T {
        &self.0
    }

    /// Transform the wrapped value without unwrapping it.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sensitive<U> {
        Sensitive(f(self.0))
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sensitive(***)")
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl<T: Serialize> Serialize for Sensitive<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sensitive<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Sensitive)
    }
}

/// Serialize a sensitive value wrapped in the engine's secret envelope:
///
/// ```json
/// { "4dabf18193072939515e22adb298388d": "1b47061264138c4ac30d75fd1eb44270", "value": ... }
/// ```
///
/// Use with `#[serde(serialize_with = "secret_envelope")]`.
pub fn secret_envelope<T, S>(value: &Sensitive<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(2))?;
    map.serialize_entry(SECRET_SIG_KEY, SECRET_SIG_VALUE)?;
    map.serialize_entry("value", value.expose())?;
    map.end()
}
