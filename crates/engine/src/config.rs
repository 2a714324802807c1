//! Engine-side configuration payload.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Compilation target profile understood by the engine.
///
/// Parsing never fails: values outside the recognized set are kept verbatim in
/// [`TargetProfile::Unrecognized`] so they can still be forwarded and let the engine apply its
/// own default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TargetProfile {
	/// Restricted instruction set.
	Base,
	/// No restrictions.
	#[default]
	Unrestricted,
	/// Any other value read from configuration.
	Unrecognized(String),
}

impl TargetProfile {
	/// Parses a configuration value.
	pub fn parse(value: &str) -> Self {
		match value {
			"base" => Self::Base,
			"unrestricted" => Self::Unrestricted,
			other => Self::Unrecognized(other.to_string()),
		}
	}

	/// Returns the wire form of this profile.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Base => "base",
			Self::Unrestricted => "unrestricted",
			Self::Unrecognized(value) => value,
		}
	}

	/// Whether this profile is one of the recognized values.
	pub fn is_recognized(&self) -> bool {
		!matches!(self, Self::Unrecognized(_))
	}
}

impl fmt::Display for TargetProfile {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Serialize for TargetProfile {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for TargetProfile {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let value = String::deserialize(deserializer)?;
		Ok(Self::parse(&value))
	}
}

/// Payload of [`crate::Session::update_configuration`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfiguration {
	/// Target profile for compilation.
	pub target_profile: TargetProfile,
}

impl EngineConfiguration {
	/// Configuration carrying only a target profile.
	pub fn with_profile(target_profile: TargetProfile) -> Self {
		Self { target_profile }
	}
}
