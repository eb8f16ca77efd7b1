use docrag_core::types::SearchResult;

const PREAMBLE: &str = "You are a helpful AI assistant that gives accurate, relevant information.

Use the following context to answer the user's question.
If the answer is not in the context, say so honestly instead of guessing.";

/// Fills the fixed answer template. Passages are joined by blank lines; no
/// passages leaves the CONTEXT section empty.
pub fn build_rag_prompt(question: &str, context: &[SearchResult]) -> String {
    let joined = context.iter().map(|r| r.text.as_str()).collect::<Vec<_>>().join("\n\n");
    format!("{PREAMBLE}\n\nCONTEXT:\n{joined}\n\nQUESTION: {question}\n\nANSWER:")
}
