use chrono::{DateTime, Local, TimeZone, Utc};

/// Split message text into paragraphs of lines.
///
/// Paragraphs are separated by one or more blank (whitespace-only) lines.
pub fn paragraphs(content: &str) -> Vec<Vec<&str>> {
    let mut result: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                result.push(std::mem::take(&mut current));
            }
            continue;
        }
        if current.is_empty() {
            current.push(line.trim_start());
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        result.push(current);
    }
    result
}

/// `HH:MM` in local time, as shown under each message
pub fn message_time(timestamp: &DateTime<Utc>) -> String {
    clock_time(&timestamp.with_timezone(&Local))
}

pub fn clock_time<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format("%H:%M").to_string()
}
