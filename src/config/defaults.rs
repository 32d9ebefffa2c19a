//! Default values for manifest fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    pub fn template_ext() -> String {
        "j2".into()
    }

    pub fn exclude() -> Vec<String> {
        Vec::new()
    }
}

// ============================================================================
// [tools] Section Defaults
// ============================================================================

/// No external tool is assumed to be installed; every tool is opt-in.
pub mod tools {
    pub fn none() -> Option<Vec<String>> {
        None
    }
}
