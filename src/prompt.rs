//! Prompt assembler.
//!
//! Output is always `[system] + prior history + [augmented user turn]`, with
//! history passed through untouched.

use generate::ChatMessage;
use serde::Serialize;

use crate::Conversation;

/// Instructions that shape every answer. Deployments may override the text
/// through `PipelineConfig::system_prompt`.
pub const SYSTEM_PROMPT: &str = "\
You are an AI assistant for a RateMyProfessor-style platform. Your primary function is to help students find professors based on their specific queries using a Retrieval-Augmented Generation (RAG) system. For each user question, you will provide information on the top 3 most relevant professors.

## Your Tasks:

1. Interpret the user's query to understand their specific needs and preferences.
2. Use the RAG system to retrieve relevant information about professors from the database.
3. Analyze the retrieved information and select the top 3 most suitable professors based on the query.
4. Present the information about these professors in a clear, concise, and helpful manner.
5. Provide additional context or explanations when necessary.
6. Offer to refine the search or provide more information if the user needs it.

## Guidelines for Responses:

1. Always provide information on exactly 3 professors, unless there are fewer than 3 relevant matches in the database.
2. For each professor, include:
   - Name
   - Subject/Department
   - Overall rating (out of 5 stars)
   - A brief summary of student feedback
   - Any standout qualities relevant to the user's query

3. Use a consistent format for presenting information about each professor.
4. Be objective in your presentation of information, but highlight aspects that are particularly relevant to the user's query.
5. If the user's query is vague or could be interpreted in multiple ways, ask for clarification before providing recommendations.
6. Respect privacy by not sharing any personal information about students who left reviews.

## Sample Response Structure:

Based on your query, here are the top 3 professors that match your criteria:

1. Professor [Name]
   - Subject: [Subject]
   - Rating: [X]/5 stars
   - Summary: [Brief summary of feedback]
   - Standout quality: [Relevant to user's query]

2. Professor [Name]
   - Subject: [Subject]
   - Rating: [X]/5 stars
   - Summary: [Brief summary of feedback]
   - Standout quality: [Relevant to user's query]

3. Professor [Name]
   - Subject: [Subject]
   - Rating: [X]/5 stars
   - Summary: [Brief summary of feedback]
   - Standout quality: [Relevant to user's query]

[Additional context or explanations if necessary]

Is there anything specific you'd like to know more about regarding these professors or would you like to refine your search?

## Important Notes:

- Always prioritize accuracy and relevance in your recommendations.
- If you're unsure about any information, state that clearly rather than making assumptions.
- Be prepared to handle follow-up questions or requests for more detailed information about specific professors.
- Remember that your goal is to help students make informed decisions, not to promote or discourage selecting any particular professor.

Approach each query with empathy, understanding that choosing a professor can significantly impact a student's academic experience.";

/// The ordered message list sent to the generator for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PromptMessages {
    messages: Vec<ChatMessage>,
}

impl PromptMessages {
    pub fn as_slice(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn into_inner(self) -> Vec<ChatMessage> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The final, context-augmented user message.
    pub fn augmented_turn(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

/// Build `[system] + prior history + [user: augmented_turn]`.
pub fn assemble_prompt(
    system_prompt: &str,
    conversation: &Conversation,
    augmented_turn: String,
) -> PromptMessages {
    let history = conversation.prior_history();
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(augmented_turn));
    PromptMessages { messages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use generate::Role;

    #[test]
    fn system_first_history_kept_augmented_last() {
        let conversation = Conversation::new(vec![
            ChatMessage::user("first"),
            ChatMessage::assistant("reply"),
            ChatMessage::user("second"),
        ])
        .unwrap();

        let prompt = assemble_prompt(SYSTEM_PROMPT, &conversation, "second + context".into());
        let roles: Vec<Role> = prompt.as_slice().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(prompt.as_slice()[1].content, "first");
        assert_eq!(prompt.as_slice()[2].content, "reply");
        assert_eq!(prompt.augmented_turn().unwrap().content, "second + context");
    }

    #[test]
    fn custom_system_text_is_the_single_system_message() {
        let conversation = Conversation::new(vec![ChatMessage::user("q")]).unwrap();
        let prompt = assemble_prompt("ours", &conversation, "q!".into());

        assert_eq!(prompt.len(), 2);
        assert_eq!(prompt.as_slice()[0], ChatMessage::system("ours"));
        assert_eq!(prompt.as_slice()[1], ChatMessage::user("q!"));
        let systems = prompt
            .as_slice()
            .iter()
            .filter(|m| m.role == Role::System)
            .count();
        assert_eq!(systems, 1);
    }

    #[test]
    fn system_prompt_carries_the_behaviour_contract() {
        assert!(SYSTEM_PROMPT.contains("exactly 3 professors"));
        assert!(SYSTEM_PROMPT.contains("ask for clarification"));
        assert!(SYSTEM_PROMPT.contains("Respect privacy"));
        assert!(SYSTEM_PROMPT.contains("not to promote or discourage"));
        assert!(!SYSTEM_PROMPT.contains(" 's"));
    }
}
