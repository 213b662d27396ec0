/// Path prefix the extension-facing endpoints mount under.
pub const API_PREFIX: &str = "/connector";
