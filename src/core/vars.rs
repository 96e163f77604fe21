//! Variable expansion for command strings

use crate::core::outputs::OutputRegistry;

/// Expand `${node_id}` placeholders against recorded step outputs.
///
/// Each registry entry is substituted with the lossy textual form of its
/// path, by literal replacement in registry iteration order. Placeholders
/// naming an unknown id are left verbatim; the downstream command surfaces
/// the problem if it matters.
pub fn expand_variables(command: &str, outputs: &OutputRegistry) -> String {
    let mut expanded = command.to_string();
    for (node_id, output_path) in outputs.iter() {
        let placeholder = format!("${{{}}}", node_id);
        expanded = expanded.replace(&placeholder, &output_path.to_string_lossy());
    }
    expanded
}
