//! Voice markup rendering
//!
//! Turns an `OutboundInstruction` into the minimal markup the telephony
//! transport expects: speak, then either gather the next utterance or hang
//! up. The engine itself never sees this format.

use call_agent_config::VoiceConfig;
use call_agent_core::OutboundInstruction;

/// Webhook path the gather posts the next turn to
pub const PROCESS_PATH: &str = "/process";

/// Render an instruction as a voice response document
pub fn render(instruction: &OutboundInstruction, voice: &VoiceConfig) -> String {
    let say = format!(
        r#"<Say voice="{}" language="{}">{}</Say>"#,
        escape(&voice.voice),
        escape(&voice.language),
        escape(&instruction.utterance),
    );

    let body = if instruction.continue_listening {
        format!(
            r#"<Gather input="speech" action="{}" method="POST" timeout="{}" speechTimeout="auto" language="{}">{}</Gather>"#,
            PROCESS_PATH,
            voice.gather_timeout_seconds,
            escape(&voice.language),
            say,
        )
    } else if instruction.hang_up {
        format!("{}<Hangup/>", say)
    } else {
        say
    };

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Response>{}</Response>"#,
        body
    )
}

/// Escape text for inclusion in XML content or attribute values
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
