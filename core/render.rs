use crate::tree::TreeNode;
use chrono::{DateTime, SecondsFormat, Utc};

const BRANCH: &str = "├── ";
const CORNER: &str = "└── ";
const CONTINUATION: &str = "│   ";
const BLANK: &str = "    ";

/// Draw `nodes` as a tree, one line per node, every line starting with `prefix`.
pub fn render_tree(nodes: &[TreeNode], prefix: &str) -> String {
    let mut result = String::new();
    render_into(&mut result, nodes, prefix);
    result
}

fn render_into(out: &mut String, nodes: &[TreeNode], prefix: &str) {
    for (i, node) in nodes.iter().enumerate() {
        let is_last = i + 1 == nodes.len();
        out.push_str(prefix);
        out.push_str(if is_last { CORNER } else { BRANCH });

        match node {
            TreeNode::Directory { name, children, .. } => {
                out.push_str(&format!("📁 **{}/**\n", name));
                if !children.is_empty() {
                    let next_prefix = format!("{}{}", prefix, if is_last { BLANK } else { CONTINUATION });
                    render_into(out, children, &next_prefix);
                }
            }
            TreeNode::File { name, size, .. } => {
                out.push_str(&format!("📄 `{}` ({}KB)\n", name, format_size_kb(*size)));
            }
        }
    }
}

/// Size in KB with one decimal, rounded half-up; zero bytes is "0".
pub fn format_size_kb(size: u64) -> String {
    if size == 0 {
        return "0".to_string();
    }
    let tenths = (u128::from(size) * 10 + 512) / 1024;
    format!("{}.{}", tenths / 10, tenths % 10)
}

/// Timestamp in the `2024-01-31T09:30:00.000Z` form used in document headers.
pub fn format_timestamp(generated_at: &DateTime<Utc>) -> String {
    generated_at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn render_tree_document(
    workspace_name: &str,
    nodes: &[TreeNode],
    generated_at: &DateTime<Utc>,
) -> String {
    let mut markdown = String::from("# Project Directory Tree\n\n");
    markdown.push_str(&format!("**Generated:** {}\n", format_timestamp(generated_at)));
    markdown.push_str(&format!("**Workspace:** {}\n\n", workspace_name));

    markdown.push_str("## 📁 Directory Structure\n\n");
    markdown.push_str(&render_tree(nodes, ""));

    markdown.push_str("\n---\n\n");
    markdown.push_str("## 🤖 Instructions for LLM\n\n");
    markdown.push_str("Please analyze this directory structure and provide a list of files you would like to examine for code analysis, debugging, or review.\n\n");
    markdown.push_str("**Format your response as a simple list:**\n");
    markdown.push_str("```\n");
    markdown.push_str("src/main.ts\n");
    markdown.push_str("src/utils/helper.js\n");
    markdown.push_str("package.json\n");
    markdown.push_str("README.md\n");
    markdown.push_str("```\n\n");
    markdown.push_str("**Guidelines:**\n");
    markdown.push_str("- Include the relative file paths exactly as shown above\n");
    markdown.push_str("- Focus on the most important files for understanding the codebase\n");
    markdown.push_str("- Consider configuration files, main entry points, and core logic\n");
    markdown.push_str("- You can request up to 20-30 files for optimal analysis\n");
    markdown
}
