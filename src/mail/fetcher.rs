use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;

use crate::clean::Cleaner;
use crate::domain::email::RawEmail;
use crate::mail::decoders::{extract_plain_text, header_value};
use crate::mail::source::MailSource;
use crate::store::json::write_records;

pub struct FetchOptions {
    pub max_pages: u32,
    /// Subjects containing this are treated as forwards and skipped.
    pub skip_subject_containing: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub pages: u32,
    pub kept: usize,
    pub duplicate_threads: usize,
    pub skipped_subject: usize,
    pub empty_bodies: usize,
    pub failed_messages: usize,
    pub failed_pages: u32,
}

enum Outcome {
    Kept(RawEmail),
    SeenThread,
    SkippedSubject,
    EmptyBody,
}

/// Harvests the first message seen in each thread and writes them to
/// `output`, rewriting the file after every page.
///
/// A failed message or page is logged and skipped. A failed page is retried
/// with the same page token until `max_pages` attempts are used up.
pub fn fetch_initial_emails(
    source: &dyn MailSource,
    cleaner: &Cleaner,
    opts: &FetchOptions,
    output: &Path,
) -> Result<(Vec<RawEmail>, FetchReport)> {
    let mut emails = Vec::new();
    let mut seen_threads = HashSet::new();
    let mut report = FetchReport::default();
    let mut page_token: Option<String> = None;

    for page_number in 1..=opts.max_pages {
        let page = match source.list_page(page_token.as_deref()) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Error fetching page {page_number}: {e:#}");
                report.failed_pages += 1;
                continue;
            }
        };
        if page.messages.is_empty() {
            log::info!("No more messages to fetch.");
            break;
        }
        report.pages += 1;

        for msg in &page.messages {
            match process_message(source, cleaner, opts, &msg.id, &mut seen_threads) {
                Ok(Outcome::Kept(email)) => emails.push(email),
                Ok(Outcome::SeenThread) => report.duplicate_threads += 1,
                Ok(Outcome::SkippedSubject) => report.skipped_subject += 1,
                Ok(Outcome::EmptyBody) => report.empty_bodies += 1,
                Err(e) => {
                    log::warn!("Error processing email {}: {e:#}", msg.id);
                    report.failed_messages += 1;
                }
            }
        }

        write_records(output, &emails)?;
        log::info!(
            "page {page_number}: {} emails kept so far, saved to {}",
            emails.len(),
            output.display()
        );

        page_token = page.next_page_token;
        if page_token.is_none() {
            log::info!("No more pages to fetch.");
            break;
        }
    }

    write_records(output, &emails)?;
    report.kept = emails.len();
    Ok((emails, report))
}

fn process_message(
    source: &dyn MailSource,
    cleaner: &Cleaner,
    opts: &FetchOptions,
    id: &str,
    seen_threads: &mut HashSet<String>,
) -> Result<Outcome> {
    let message = source.get_message(id)?;
    if !seen_threads.insert(message.thread_id.clone()) {
        return Ok(Outcome::SeenThread);
    }

    let payload = message.payload.unwrap_or_default();
    let subject = header_value(&payload.headers, "Subject")
        .unwrap_or("No Subject")
        .to_string();
    if let Some(skip) = &opts.skip_subject_containing
        && subject.contains(skip.as_str())
    {
        return Ok(Outcome::SkippedSubject);
    }

    let body = cleaner.clean_body(extract_plain_text(&payload).trim());
    if body.trim().is_empty() {
        return Ok(Outcome::EmptyBody);
    }

    Ok(Outcome::Kept(RawEmail {
        thread_id: message.thread_id,
        subject,
        body,
    }))
}
