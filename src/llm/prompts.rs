//! Default reviewer prompts.

/// System instruction sent with every reconcile call.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are a precise Thai document editor. Output strictly valid JSON.";

/// Default reconcile prompt.
///
/// `{count}` is replaced with the number of OCR versions and `{versions}`
/// with one `Version N: <encoded text>` line per version.
pub const DEFAULT_RECONCILE_PROMPT: &str = r#"You are an expert Thai document editor. The same scanned page was transcribed by {count} different OCR configurations.
Combine them into ONE corrected version of the page and extract metadata.

INPUT VERSIONS:
{versions}

INSTRUCTIONS:
1. **Consolidate & Fix**: Compare the versions to reconstruct the most likely original text. Fix Thai vowel issues (floating or detached vowels) and spelling errors.
2. **Metadata**: Identify the document type, the subject and the key entities of the page.
3. **Numbers**: Keep the original numbers but repair formatting errors (e.g. '1,0 00' -> '1,000').
4. **Common Thai OCR errors**: Rejoin broken vowels (e.g. 'เ- ก- า' -> 'เกา'). Resolve confused digits (Thai ๑ vs Arabic 1).
5. **DO NOT translate**: Keep the original language and wording; only fix mistakes and typos.

OUTPUT FORMAT (strict JSON):
{
    "clean_text": "The full corrected text of the page...",
    "doc_type": "The type of document (e.g. ระเบียบ)",
    "subject": "A one-sentence summary of the page",
    "entities": "Names, dates or organizations found on the page"
}"#;
