// Prompt templates for the single-call text tasks.
// The portfolio pipeline keeps its own prompts in portfolio/prompts.rs.

/// Replace: {text}
pub const SUMMARIZE_PROMPT: &str = "\
Summarize the following text in exactly three lines focused on its key points, \
then extract three related keywords on a final line starting with 'Keywords:'.

Original text:
{text}";

/// Replace: {text}
pub const SENTIMENT_PROMPT: &str = "\
Classify the sentiment of the following text as exactly one of 'positive', \
'negative' or 'neutral', then explain the reason in one sentence.

Original text:
{text}";

/// Replace: {query}
pub const GENERATE_RESPONSE_PROMPT: &str = "\
Write a helpful answer to the following request.

Request: {query}";

/// Replace: {text}
pub const PARAPHRASE_PROMPT: &str = "\
Rewrite the following text so that it keeps exactly the same meaning but uses \
different wording. Return only the rewritten text.

Original text:
{text}";

/// Replace: {source_clause}, {target_language}, {text}
pub const TRANSLATE_PROMPT: &str = "\
Translate the following text{source_clause} into {target_language}. \
Return only the translation, without notes or transliteration.

Text:
{text}";

/// Replace: {topic}, {keywords}, {genre}, {length}
pub const STORY_PROMPT: &str = "\
Write an original, creative story.

Topic: {topic}
Keywords to weave in: {keywords}
Genre: {genre}
Length: {length}

Give the story a title on the first line.";

/// Replace: {query}
pub const IMAGE_PROMPT: &str = "\
Look at the attached image and answer the question about it.

Question: {query}";
