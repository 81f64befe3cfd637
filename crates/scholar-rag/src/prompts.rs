//! Prompt templates for document Q&A, paper reports, summaries and the research agent

/// Answer returned when retrieval produced no usable context
pub const NO_CONTEXT_ANSWER: &str = "No relevant context found to answer the question.";

pub fn qna_prompt(context: &str, question: &str, doc_name: &str, word_limit: u32) -> String {
    format!(
        "Based on the following context from the document '{}', please answer the question.\n\
        Keep the answer concise within {} words.\n\
        If the answer cannot be found in the context, explicitly say so.\n\
        \n\
        Context:\n\
        {}\n\
        \n\
        Question: {}\n\
        \n\
        Answer:",
        doc_name, word_limit, context, question
    )
}

fn related_block(retrieved_texts: &[String]) -> String {
    if retrieved_texts.is_empty() {
        "None".to_string()
    } else {
        retrieved_texts.join("\n\n")
    }
}

pub fn single_paper_report_prompt(
    paper_details: &str,
    retrieved_texts: &[String],
    sections: &[String],
    word_limit: u32,
) -> String {
    format!(
        "Generate a structured analysis report for the following paper:\n\
        \n\
        {}\n\
        \n\
        Additional relevant information from similar papers:\n\
        {}\n\
        \n\
        Please structure the report according to these sections: {}\n\
        \n\
        Requirements:\n\
        1. Stay within {} words\n\
        2. When using information from similar papers, cite the source using [Source: Paper Title]\n\
        3. Focus on key insights and findings\n\
        4. Use academic language\n\
        5. Be objective and analytical\n\
        \n\
        Format the report with clear section headers and proper citations.",
        paper_details,
        related_block(retrieved_texts),
        sections.join(", "),
        word_limit
    )
}

pub fn multi_paper_report_prompt(
    paper_details: &[String],
    retrieved_texts: &[String],
    sections: &[String],
    word_limit: u32,
) -> String {
    format!(
        "Generate a comparative analysis report for the following papers:\n\
        \n\
        PRIMARY PAPERS:\n\
        {}\n\
        \n\
        ADDITIONAL RELEVANT INFORMATION:\n\
        {}\n\
        \n\
        Please structure the report according to these sections: {}\n\
        \n\
        Requirements:\n\
        1. Stay within {} words\n\
        2. Use proper citations:\n   \
        - When discussing primary papers, cite as [Primary: Paper Title]\n   \
        - When using information from similar papers, cite as [Source: Paper Title]\n\
        3. Compare and contrast the papers' approaches, findings, and conclusions\n\
        4. Highlight common themes and differences\n\
        5. Use academic language\n\
        6. Be objective and analytical\n\
        \n\
        Guidelines for comparison:\n\
        - Identify common themes across papers\n\
        - Note significant differences in approaches or conclusions\n\
        - Synthesize findings from all sources\n\
        - Draw connections between related concepts\n\
        - Highlight complementary or contradictory findings\n\
        \n\
        Format the report with:\n\
        - Clear section headers\n\
        - Proper citations throughout\n\
        - Balanced coverage of all primary papers\n\
        - Integration of relevant supporting information",
        paper_details.join("\n\n"),
        related_block(retrieved_texts),
        sections.join(", "),
        word_limit
    )
}

pub fn summary_prompt(text: &str, instruction: &str, word_limit: u32) -> String {
    format!(
        "{} of the following text in no more than {} words:\n\
        {}\n\
        \n\
        INSTRUCTIONS: Keep the summary extremely brief and strictly adhere to the {} word limit.\n\
        Be concise and focus only on the core result.\n\
        \n\
        SUMMARY:",
        instruction, word_limit, text, word_limit
    )
}

/// Answer returned when the agent runs out of steps
pub const AGENT_STOPPED_ANSWER: &str = "Agent stopped due to iteration limit or time limit.";

const RESEARCH_AGENT_PROCESS: &str = "Follow this process:\n\
    1. Search for an overview first\n\
    2. Scrape key URLs when technical details are needed\n\
    3. Cite sources using [Source N] notation\n\
    4. Include a reference section at the end\n\
    \n\
    Format response as:\n\
    **Analysis**\n\
    [Concise summary with citations]\n\
    \n\
    **Key Findings**\n\
    - Point 1 [Source X]\n\
    - Point 2 [Source Y]\n\
    \n\
    **References**\n\
    1. [Title] - [URL]\n\
    ...";

/// One agent turn: tool list, process, the question and the steps taken so far
pub fn research_agent_prompt(question: &str, scratchpad: &str) -> String {
    format!(
        "You are a research assistant answering questions with web sources.\n\
        \n\
        {}\n\
        \n\
        You have access to the following tools:\n\
        Web_Search: Search the web for research topics. Returns up to 3 relevant sources. Input: a search query.\n\
        Page_Scraper: Scrape content from specific URLs. Input must be a valid URL.\n\
        \n\
        Respond with a single JSON object and nothing else:\n\
        {{\"action\": \"Web_Search\" | \"Page_Scraper\" | \"Final Answer\", \"action_input\": \"...\"}}\n\
        Use \"Final Answer\" with the complete formatted response once you know enough.\n\
        \n\
        Question: {}\n\
        \n\
        Steps so far:\n\
        {}",
        RESEARCH_AGENT_PROCESS,
        question,
        if scratchpad.trim().is_empty() { "None" } else { scratchpad }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qna_prompt_mentions_limit_and_document() {
        let prompt = qna_prompt("Attention only.", "What is used?", "paper.pdf", 150);
        assert!(prompt.starts_with("Based on the following context from the document 'paper.pdf'"));
        assert!(prompt.contains("within 150 words"));
        assert!(prompt.contains("Context:\nAttention only.\n\nQuestion: What is used?"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn test_report_prompts_list_sections() {
        let sections = vec!["Abstract".to_string(), "Methods".to_string()];

        let single = single_paper_report_prompt("Title: A", &[], &sections, 300);
        assert!(single.contains("sections: Abstract, Methods"));
        assert!(single.contains("Additional relevant information from similar papers:\nNone"));

        let multi = multi_paper_report_prompt(
            &["Title: A".to_string(), "Title: B".to_string()],
            &["[Source: C]".to_string()],
            &sections,
            500,
        );
        assert!(multi.contains("PRIMARY PAPERS:\nTitle: A\n\nTitle: B"));
        assert!(multi.contains("Stay within 500 words"));
        assert!(multi.contains("[Primary: Paper Title]"));
    }

    #[test]
    fn test_summary_prompt() {
        let prompt = summary_prompt("Long text", "Summarize the key result", 40);
        assert!(prompt.starts_with("Summarize the key result of the following text in no more than 40 words:\nLong text"));
        assert!(prompt.ends_with("SUMMARY:"));
    }

    #[test]
    fn test_research_agent_prompt() {
        let prompt = research_agent_prompt("What is RLHF?", "");
        assert!(prompt.contains("1. Search for an overview first\n"));
        assert!(prompt.contains("Page_Scraper: Scrape content from specific URLs."));
        assert!(prompt.contains("{\"action\": \"Web_Search\""));
        assert!(prompt.ends_with("Question: What is RLHF?\n\nSteps so far:\nNone"));
    }
}
