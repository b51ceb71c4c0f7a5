//! HTML pages for browser visitors of the verification link.

use std::fmt::Write;

use axum::http::StatusCode;

use crate::certificates::{PublicCertificate, format_hours};

/// Escape text for HTML element and attribute content.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(brand: &str, title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta name="robots" content="noindex">
<title>{title} | {brand}</title>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  body {{ font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
         color: #1f2328; background: #f6f8fa; line-height: 1.6; }}
  .container {{ max-width: 640px; margin: 0 auto; padding: 3rem 1rem; }}
  .brand {{ text-align: center; color: #333399; font-weight: 700; letter-spacing: 0.05em;
            margin-bottom: 1.5rem; }}
  .card {{ background: #fff; border: 1px solid #d0d7de; border-radius: 8px; padding: 2rem; }}
  .status {{ font-weight: 700; padding: 0.5rem 0.75rem; border-radius: 6px; margin-bottom: 1.5rem; }}
  .valid {{ background: #dafbe1; color: #116329; }}
  .revoked {{ background: #ffebe9; color: #a40e26; }}
  table {{ width: 100%; border-collapse: collapse; }}
  th, td {{ padding: 0.5rem 0; text-align: left; border-bottom: 1px solid #eaeef2; }}
  th {{ color: #656d76; font-weight: 600; width: 40%; }}
  code {{ font-size: 0.85em; }}
  p {{ color: #656d76; }}
</style>
</head>
<body>
<div class="container">
  <div class="brand">{brand}</div>
  <div class="card">
{body}
  </div>
</div>
</body>
</html>"#,
        brand = escape(brand),
        title = escape(title),
    )
}

/// Page shown for a known certificate.
pub fn verification(brand: &str, cert: &PublicCertificate) -> String {
    let mut body = String::new();
    if cert.revoked {
        body.push_str(
            r#"    <div class="status revoked">This certificate has been revoked and is no longer valid.</div>"#,
        );
    } else {
        body.push_str(r#"    <div class="status valid">Authentic certificate</div>"#);
    }

    let _ = write!(
        body,
        r"
    <table>
      <tr><th>Student</th><td>{name}</td></tr>
      <tr><th>Subject</th><td>{subject}</td></tr>
      <tr><th>Hours of study</th><td>{hours}</td></tr>
      <tr><th>Issued on</th><td>{issued}</td></tr>
      <tr><th>Verification code</th><td><code>{identifier}</code></td></tr>
    </table>",
        name = escape(&cert.student_name),
        subject = escape(&cert.subject),
        hours = format_hours(cert.total_hours),
        issued = cert.issued_at.format("%Y-%m-%d"),
        identifier = escape(&cert.identifier),
    );

    layout(brand, "Certificate verification", &body)
}

/// Page shown when a lookup produced no certificate.
pub fn lookup_failed(brand: &str, status: StatusCode) -> String {
    let message = if status == StatusCode::NOT_FOUND {
        "No certificate matches this verification code."
    } else {
        "Verification is temporarily unavailable. Please try again shortly."
    };
    layout(
        brand,
        "Certificate verification",
        &format!("    <p>{message}</p>"),
    )
}
