//! Prompt templates for every summarization variant.
//!
//! Pure string assembly; the processor decides which variant applies. All
//! prompts end with the same instruction to suppress chain-of-thought, so
//! reasoning models return only the summary text.

/// Node kinds that receive a generic hierarchical summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchicalKind {
    SourceFile,
    Directory,
    Package,
    Project,
}

impl HierarchicalKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::SourceFile => "source file",
            Self::Directory => "directory",
            Self::Package => "package",
            Self::Project => "project",
        }
    }
}

/// Which relation a refinement step folds in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodRelation {
    Callers,
    Callees,
}

/// Which relation a type refinement step folds in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRelation {
    Parents,
    Members,
}

/// Prompt for analyzing a method body, or one chunk of it.
///
/// First/last flags pick the single-shot, opening, continuation, or
/// closing variant; continuation variants thread the running summary.
pub fn method_analysis(
    chunk: &str,
    is_first_chunk: bool,
    is_last_chunk: bool,
    running_summary: &str,
) -> String {
    if is_first_chunk {
        if is_last_chunk {
            format!(
                "Summarize the purpose of this method based on its code. \
                 Provide a concise, one-paragraph technical analysis. \
                 Do not respond with your reasoning process, only the summary.\
                 \n\n```\n{chunk}\n```"
            )
        } else {
            format!(
                "Summarize this code, which is the beginning of a larger \
                 method. Provide a concise, one-paragraph technical analysis. \
                 Do not respond with your reasoning process, only the summary.\
                 \n\n```\n{chunk}\n```"
            )
        }
    } else {
        let position = if is_last_chunk {
            "This is the end of the method body."
        } else {
            "The method body continues after this code."
        };
        format!(
            "The summary of the first part of a large method so far is: \n\
             '{running_summary}'\n\n\
             Here is the next part of the code:\n```\n{chunk}\n```\n\n\
             {position}\n\n\
             Please provide a new, single-paragraph summary that combines \
             the previous summary with this new code. Do not respond with \
             your reasoning process, only the summary."
        )
    }
}

/// Single-shot contextual summary of a method's role.
pub fn method_summary(
    method_name: &str,
    code_analysis: &str,
    callers: &[String],
    callees: &[String],
) -> String {
    let caller_text = if callers.is_empty() { "None".to_string() } else { callers.join("; ") };
    let callee_text = if callees.is_empty() { "None".to_string() } else { callees.join("; ") };

    format!(
        "A method named '{method_name}' is technically analyzed as: \
         '{code_analysis}'.\n\
         It is called by other methods with these responsibilities: [{caller_text}].\n\
         It calls other methods to accomplish these tasks: [{callee_text}].\n\n\
         Based on this full context, what is the high-level purpose of \
         this method in the overall system? Describe it in a concise \
         paragraph. Do not respond with your reasoning process, only the summary."
    )
}

/// One refinement step of a method summary against a chunk of caller or
/// callee summaries.
pub fn iterative_method_summary(
    running_summary: &str,
    relation_chunk: &str,
    relation: MethodRelation,
) -> String {
    match relation {
        MethodRelation::Callers => format!(
            "A method's purpose is summarized as: '{running_summary}'.\n\
             It is used by other methods with the following responsibilities: \
             [{relation_chunk}].\n\n\
             Refine the summary of the method's role in relation to its callers. \
             Provide a new, single-paragraph summary. Do not respond with \
             your reasoning process, only the summary."
        ),
        MethodRelation::Callees => format!(
            "So far, a method's role is summarized as: '{running_summary}'.\n\
             It accomplishes this by calling other methods for these purposes: \
             [{relation_chunk}].\n\n\
             Provide a final, comprehensive summary of the method's \
             overall purpose based on its callees. Provide a new, \
             single-paragraph summary. Do not respond with your reasoning \
             process, only the summary."
        ),
    }
}

/// Single-shot summary of a type from its inheritance and members.
pub fn type_summary(
    type_name: &str,
    type_label: &str,
    parent_summaries: &[String],
    member_summaries: &[String],
) -> String {
    let parent_text = if parent_summaries.is_empty() {
        String::new()
    } else {
        format!(
            "It inherits from or implements the following types: [{}].",
            parent_summaries.join("; ")
        )
    };
    let member_text = if member_summaries.is_empty() {
        String::new()
    } else {
        format!(
            "It contains members (methods, fields) with these responsibilities: [{}].",
            member_summaries.join("; ")
        )
    };

    format!(
        "A {type_label} named '{type_name}' is defined. {parent_text} {member_text}\n\n\
         Based on its inheritance and members, what is the primary responsibility \
         and role of the '{type_name}' {type_label} in the system? \
         Describe it in a concise paragraph. Do not respond with your reasoning \
         process, only the summary."
    )
}

/// One refinement step of a type summary against a chunk of parent or
/// member summaries.
pub fn iterative_type_summary(
    type_name: &str,
    type_label: &str,
    running_summary: &str,
    relation_chunk: &str,
    relation: TypeRelation,
) -> String {
    match relation {
        TypeRelation::Parents => format!(
            "The summary for the {type_label} '{type_name}' is currently: '{running_summary}'.\n\
             It inherits from or implements types with these roles: [{relation_chunk}].\n\n\
             Refine the summary to include the role of its inheritance. \
             Provide a new, single-paragraph summary. Do not respond with \
             your reasoning process, only the summary."
        ),
        TypeRelation::Members => format!(
            "So far, the role of the {type_label} '{type_name}' is summarized as: \
             '{running_summary}'.\n\
             It implements members (methods, fields) to perform these functions: \
             [{relation_chunk}].\n\n\
             Provide a final, comprehensive summary of the type's overall purpose. \
             Provide a new, single-paragraph summary. Do not respond with \
             your reasoning process, only the summary."
        ),
    }
}

/// Seed sentence iterative type summarization starts from.
pub fn type_summary_seed(type_name: &str, type_label: &str) -> String {
    format!(
        "A {type_label} named '{type_name}' that serves a purpose to be defined by its relationships."
    )
}

/// Single-shot summary of a container node from its children's context.
pub fn hierarchical_summary(kind: HierarchicalKind, node_name: &str, context: &str) -> String {
    format!(
        "Based on the following context, provide a concise summary for the \
         {} named '{node_name}'.\n\
         Context:\n{context}\n\
         Summary:\n",
        kind.label()
    )
}

/// One refinement step of a container summary against a chunk of child
/// summaries.
pub fn iterative_hierarchical_summary(
    kind: HierarchicalKind,
    node_name: &str,
    running_summary: &str,
    child_chunk: &str,
) -> String {
    let label = kind.label();
    format!(
        "The summary for the {label} '{node_name}' is currently: '{running_summary}'.\n\
         It contains child components with the following responsibilities: \
         [{child_chunk}].\n\n\
         Refine the summary for the {label} '{node_name}' based on this new information. \
         Provide a new, single-paragraph summary. Do not respond with \
         your reasoning process, only the summary."
    )
}

/// Seed sentence iterative hierarchical summarization starts from.
pub fn hierarchical_summary_seed(kind: HierarchicalKind, node_name: &str) -> String {
    format!(
        "A {} named '{node_name}' that serves a purpose to be defined by its contents.",
        kind.label()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_analysis_variants() {
        let single = method_analysis("code", true, true, "");
        assert!(single.contains("```\ncode\n```"));
        assert!(!single.contains("continues"));

        let first = method_analysis("code", true, false, "");
        assert!(first.contains("beginning of a larger"));

        let middle = method_analysis("code", false, false, "so far");
        assert!(middle.contains("'so far'"));
        assert!(middle.contains("The method body continues after this code."));

        let last = method_analysis("code", false, true, "so far");
        assert!(last.contains("This is the end of the method body."));
    }

    #[test]
    fn method_summary_handles_missing_relations() {
        let prompt = method_summary("run", "does work", &[], &[]);
        assert!(prompt.contains("[None]"));

        let callers = vec!["schedules work".to_string()];
        let prompt = method_summary("run", "does work", &callers, &[]);
        assert!(prompt.contains("[schedules work]"));
    }

    #[test]
    fn type_summary_omits_empty_sections() {
        let prompt = type_summary("Engine", "Class", &[], &[]);
        assert!(!prompt.contains("inherits from"));
        assert!(!prompt.contains("contains members"));

        let parents = vec!["a base service".to_string()];
        let prompt = type_summary("Engine", "Class", &parents, &[]);
        assert!(prompt.contains("[a base service]"));
    }

    #[test]
    fn hierarchical_uses_kind_label() {
        let prompt = hierarchical_summary(HierarchicalKind::Directory, "/src/util", "ctx");
        assert!(prompt.contains("directory named '/src/util'"));

        let prompt = hierarchical_summary(HierarchicalKind::Project, "demo", "ctx");
        assert!(prompt.contains("project named 'demo'"));
    }
}
