//! Runtime support for generated programs.
//!
//! The compiler turns every literal section into a call to [`print`], and
//! generated programs import this module (the injected `use weft::runtime;`
//! points here). Nothing in the compiler itself calls these functions.
//!
//! All output is buffered: body text accumulates in a process-wide buffer and
//! nothing is written until [`send_cgi`] or [`send_body`] assembles the
//! response. That deferral is the point — a generated page can call
//! [`set_status`] or [`redirect`] *after* emitting body content, any number
//! of times, and only the last call shows up in the headers.
//!
//! Generated CGI programs are single-threaded; the mutex exists so the API
//! stays sound if one ever isn't.

use std::fmt::Display;
use std::io::{self, Write};
use std::sync::Mutex;

struct Output {
    status: Option<String>,
    location: Option<String>,
    body: String,
}

static OUTPUT: Mutex<Output> = Mutex::new(Output {
    status: None,
    location: None,
    body: String::new(),
});

fn with_output<T>(f: impl FnOnce(&mut Output) -> T) -> T {
    let mut output = OUTPUT.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut output)
}

/// Append a string to the body buffer.
pub fn write_str(text: &str) {
    with_output(|out| out.body.push_str(text));
}

/// Append any displayable value to the body buffer.
///
/// This is the emission function generated code calls for every literal
/// section; the argument there is a raw string or a `'"'` char.
pub fn print(value: impl Display) {
    with_output(|out| {
        use std::fmt::Write as _;
        // Writing into a String cannot fail.
        let _ = write!(out.body, "{value}");
    });
}

/// Like [`print`], with a trailing newline.
pub fn println(value: impl Display) {
    print(value);
    write_str("\n");
}

/// Queue a `Status:` header. Repeated calls overwrite each other; only the
/// last one is emitted.
pub fn set_status(status_code: u16, reason_phrase: &str) {
    with_output(|out| out.status = Some(format!("Status: {status_code} {reason_phrase}")));
}

/// Queue a permanent redirect (301 Moved Permanently).
pub fn redirect(url: &str) {
    redirect_with_status(url, 301, "Moved Permanently");
}

/// Queue a redirect with an explicit status. Like [`set_status`], callable
/// after body output and any number of times; the last call wins.
pub fn redirect_with_status(url: &str, status_code: u16, reason_phrase: &str) {
    with_output(|out| {
        out.status = Some(format!("Status: {status_code} {reason_phrase}"));
        out.location = Some(format!("Location: {url}"));
    });
}

/// Write the complete CGI response: headers, blank separator, body.
///
/// Headers, in order: `Content-Type`, queued `Status`, queued `Location`,
/// `Content-Length` computed over the whitespace-trimmed body.
pub fn send_cgi(writer: &mut impl Write) -> io::Result<()> {
    with_output(|out| {
        let body = out.body.trim().to_string();
        let mut headers = vec!["Content-Type: text/html; charset=utf-8".to_string()];
        if let Some(status) = &out.status {
            headers.push(status.clone());
        }
        if let Some(location) = &out.location {
            headers.push(location.clone());
        }
        headers.push(format!("Content-Length: {}", body.len()));

        writer.write_all(headers.join("\n").as_bytes())?;
        writer.write_all(b"\n\n")?;
        writer.write_all(body.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()
    })
}

/// Write the raw body buffer, no headers.
pub fn send_body(writer: &mut impl Write) -> io::Result<()> {
    with_output(|out| {
        writer.write_all(out.body.as_bytes())?;
        writer.flush()
    })
}

/// Clear all buffered state: body, status, location.
pub fn reset() {
    with_output(|out| {
        out.status = None;
        out.location = None;
        out.body.clear();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    // The buffer is process-global, so every test drives a full
    // reset → emit → send sequence under one lock.
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    fn capture_cgi() -> String {
        let mut bytes = Vec::new();
        send_cgi(&mut bytes).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn body_accumulates_in_call_order() {
        let _guard = TEST_LOCK.lock().unwrap();
        reset();
        print("<h1>");
        print("Hi");
        print('"');
        write_str("</h1>");

        let response = capture_cgi();
        assert!(response.ends_with("<h1>Hi\"</h1>\n"), "{response}");
    }

    #[test]
    fn plain_response_has_type_and_length_only() {
        let _guard = TEST_LOCK.lock().unwrap();
        reset();
        print("abcde");

        let response = capture_cgi();
        let (head, body) = response.split_once("\n\n").unwrap();
        assert_eq!(
            head,
            "Content-Type: text/html; charset=utf-8\nContent-Length: 5"
        );
        assert_eq!(body, "abcde\n");
    }

    #[test]
    fn content_length_counts_trimmed_body() {
        let _guard = TEST_LOCK.lock().unwrap();
        reset();
        print("  padded  \n");

        let response = capture_cgi();
        assert!(response.contains("Content-Length: 6"), "{response}");
        assert!(response.ends_with("\n\npadded\n"), "{response}");
    }

    #[test]
    fn last_status_call_wins() {
        let _guard = TEST_LOCK.lock().unwrap();
        reset();
        set_status(500, "Internal Server Error");
        print("gone");
        set_status(404, "Not Found");

        let response = capture_cgi();
        assert!(response.contains("Status: 404 Not Found"), "{response}");
        assert!(!response.contains("500"), "{response}");
    }

    #[test]
    fn redirect_sets_status_and_location() {
        let _guard = TEST_LOCK.lock().unwrap();
        reset();
        redirect("/new-home");

        let response = capture_cgi();
        assert!(
            response.contains("Status: 301 Moved Permanently"),
            "{response}"
        );
        assert!(response.contains("Location: /new-home"), "{response}");
    }

    #[test]
    fn redirect_after_body_output_still_applies() {
        let _guard = TEST_LOCK.lock().unwrap();
        reset();
        print("already emitted");
        redirect_with_status("/elsewhere", 302, "Found");

        let response = capture_cgi();
        assert!(response.contains("Status: 302 Found"), "{response}");
        assert!(response.contains("Location: /elsewhere"), "{response}");
        assert!(response.contains("already emitted"), "{response}");
    }

    #[test]
    fn send_body_is_raw() {
        let _guard = TEST_LOCK.lock().unwrap();
        reset();
        set_status(404, "Not Found");
        println("just the body");

        let mut bytes = Vec::new();
        send_body(&mut bytes).unwrap();
        assert_eq!(bytes, b"just the body\n");
    }

    #[test]
    fn reset_clears_everything() {
        let _guard = TEST_LOCK.lock().unwrap();
        reset();
        print("stale");
        redirect("/stale");
        reset();

        let response = capture_cgi();
        assert!(!response.contains("stale"), "{response}");
        assert!(!response.contains("Location"), "{response}");
        assert!(response.contains("Content-Length: 0"), "{response}");
    }
}
