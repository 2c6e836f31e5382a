// System instructions for the enhancement calls, plus the tag stripping applied to
// rich-text input before it is sent.

pub const CV_SYSTEM: &str = "You are an expert CV writer. \
    Rewrite the text the user sends so it reads professionally and concisely. \
    Keep the facts unchanged and do not invent experience. \
    Answer in the same language as the text. \
    Return only the rewritten text, without commentary or quotation marks.";

pub const LETTER_SYSTEM: &str = "You are an expert in cover letters. \
    Improve the letter the user sends: clearer structure, professional tone, \
    stronger opening and closing. Keep every fact from the original. \
    Answer in the same language as the letter. \
    Return only the improved letter.";

/// Drops HTML tags, turning block ends and `<br>` into line breaks, and decodes the
/// handful of entities a rich-text editor emits.
pub fn plain_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut tag = String::new();
    let mut in_tag = false;

    for c in html.chars() {
        match (in_tag, c) {
            (false, '<') => {
                in_tag = true;
                tag.clear();
            }
            (true, '>') => {
                in_tag = false;
                let name = tag
                    .trim_start_matches('/')
                    .split(|c: char| c.is_whitespace() || c == '/')
                    .next()
                    .unwrap_or("")
                    .to_ascii_lowercase();
                let closes_block = tag.starts_with('/')
                    && matches!(name.as_str(), "p" | "div" | "li" | "h1" | "h2" | "h3");
                if name == "br" || closes_block {
                    out.push('\n');
                }
            }
            (true, c) => tag.push(c),
            (false, c) => out.push(c),
        }
    }

    let decoded = out
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    decoded.trim().to_string()
}
