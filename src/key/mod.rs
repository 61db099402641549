//! Key Derivation Module
//!
//! Turns a callable name and its arguments into a deterministic, fixed-length
//! cache key. Two calls with structurally equal arguments always derive the
//! same key; keyword arguments are sorted by name so insertion order never
//! matters.

mod canonical;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::KeyError;
use self::canonical::canonical_payload;

// == Receiver Policy ==
/// How a bound receiver (the `self` of a method call) participates in key
/// derivation.
///
/// The two behaviors diverge observably: under `PerInstance` two client
/// objects calling the same method with equal remaining arguments get
/// separate cache entries; under `Shared` they collide and share one entry.
/// `PerInstance` is the default because cross-instance sharing is only safe
/// when the receiver carries no state that influences the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReceiverPolicy {
    /// The receiver is serialized as a leading positional argument (default)
    #[default]
    PerInstance,
    /// The receiver is excluded from the key entirely
    Shared,
}

// == Cache Key ==
/// A derived identifier for one specific call: callable plus arguments.
///
/// The digest is the SHA-256 of the callable name and the canonical argument
/// payload, hex-encoded. Argument content never appears in the key itself,
/// so keys are safe to log. The callable name is kept alongside the digest
/// to support clearing every entry of one wrapped callable at once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    callable: String,
    digest: String,
}

impl CacheKey {
    /// The name of the callable this key belongs to.
    pub fn callable(&self) -> &str {
        &self.callable
    }

    /// The full hex digest.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl fmt::Display for CacheKey {
    /// Renders `callable:digest-prefix`, short enough for log lines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.callable, &self.digest[..8.min(self.digest.len())])
    }
}

// == Key Builder ==
/// Collects the arguments of one call and derives its [`CacheKey`].
///
/// Arguments are captured structurally via [`Serialize`]; values with no
/// structural representation use the `*_display` fallbacks, which key on the
/// value's string rendering instead. If neither works the error propagates
/// to the caller and the wrapped computation is NOT invoked: a call that
/// cannot be keyed is never silently executed uncached.
///
/// # Example
/// ```
/// use memo_cache::key::KeyBuilder;
///
/// let a = KeyBuilder::new("generate").arg(&"hello")?.kwarg("temp", &0.7)?.build()?;
/// let b = KeyBuilder::new("generate").kwarg("temp", &0.7)?.arg(&"hello")?.build()?;
/// assert_eq!(a, b);
/// # Ok::<(), memo_cache::error::KeyError>(())
/// ```
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    callable: String,
    policy: ReceiverPolicy,
    positional: Vec<Value>,
    keyword: BTreeMap<String, Value>,
}

impl KeyBuilder {
    // == Constructor ==
    /// Starts a key for the named callable with the default receiver policy.
    pub fn new(callable: impl Into<String>) -> Self {
        Self {
            callable: callable.into(),
            policy: ReceiverPolicy::default(),
            positional: Vec::new(),
            keyword: BTreeMap::new(),
        }
    }

    /// Overrides the receiver policy. Must be set before [`Self::receiver`].
    pub fn with_policy(mut self, policy: ReceiverPolicy) -> Self {
        self.policy = policy;
        self
    }

    // == Receiver ==
    /// Records the bound receiver of a method call.
    ///
    /// Under [`ReceiverPolicy::PerInstance`] the receiver joins the key as a
    /// leading positional argument; under [`ReceiverPolicy::Shared`] it is
    /// dropped. Call before any `arg`.
    pub fn receiver<R: Serialize>(mut self, receiver: &R) -> Result<Self, KeyError> {
        if self.policy == ReceiverPolicy::PerInstance {
            let value = to_value(receiver, "receiver")?;
            self.positional.push(value);
        }
        Ok(self)
    }

    /// Receiver fallback for types without a structural representation.
    pub fn receiver_display(mut self, receiver: &impl fmt::Display) -> Self {
        if self.policy == ReceiverPolicy::PerInstance {
            self.positional.push(Value::String(receiver.to_string()));
        }
        self
    }

    // == Positional Arguments ==
    /// Adds a positional argument, captured structurally.
    pub fn arg<A: Serialize>(mut self, value: &A) -> Result<Self, KeyError> {
        let label = format!("#{}", self.positional.len());
        let value = to_value(value, &label)?;
        self.positional.push(value);
        Ok(self)
    }

    /// Adds a positional argument keyed by its string rendering.
    ///
    /// The deterministic fallback for argument types that do not implement
    /// [`Serialize`].
    pub fn arg_display(mut self, value: &impl fmt::Display) -> Self {
        self.positional.push(Value::String(value.to_string()));
        self
    }

    // == Keyword Arguments ==
    /// Adds a named argument, captured structurally.
    ///
    /// Names are sorted during derivation, so
    /// `.kwarg("x", ..).kwarg("y", ..)` and the reverse order derive the
    /// same key.
    pub fn kwarg<A: Serialize>(mut self, name: impl Into<String>, value: &A) -> Result<Self, KeyError> {
        let name = name.into();
        let value = to_value(value, &name)?;
        self.keyword.insert(name, value);
        Ok(self)
    }

    /// Adds a named argument keyed by its string rendering.
    pub fn kwarg_display(mut self, name: impl Into<String>, value: &impl fmt::Display) -> Self {
        self.keyword.insert(name.into(), Value::String(value.to_string()));
        self
    }

    // == Build ==
    /// Derives the final key.
    pub fn build(self) -> Result<CacheKey, KeyError> {
        if self.callable.is_empty() {
            return Err(KeyError::EmptyCallableName);
        }

        let payload = canonical_payload(&self.positional, &self.keyword);

        let mut hasher = Sha256::new();
        hasher.update(self.callable.as_bytes());
        hasher.update(b":");
        hasher.update(payload.as_bytes());
        let digest = hex::encode(hasher.finalize());

        Ok(CacheKey {
            callable: self.callable,
            digest,
        })
    }
}

/// Structural capture of one argument, naming the argument on failure.
fn to_value<A: Serialize>(value: &A, argument: &str) -> Result<Value, KeyError> {
    serde_json::to_value(value).map_err(|e| KeyError::Unserializable {
        argument: argument.to_string(),
        reason: e.to_string(),
    })
}
