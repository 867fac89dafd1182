//! HTML fragment holding the contract form and the outcome of the last submission.
//!
//! The page script swaps the whole fragment in after every post, so the
//! fragment carries its own container element.

use crate::templates::escape_html;

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Success { contract_id: String },
    Error(String),
}

/// Values echoed back into the inputs after a failed submission.
#[derive(Debug, Clone, Default)]
pub struct FormValues {
    pub fullname: String,
    pub email: String,
    pub date: String,
}

pub fn render_form(values: &FormValues, notice: Option<&Notice>) -> String {
    let notice_html = match notice {
        Some(Notice::Success { contract_id }) => {
            let id = escape_html(contract_id);
            format!(
                r#"<div class="notice notice-success" role="status">Thank you, your contract has been signed. Reference: <code>{id}</code>. <a href="/api/contracts/{id}" target="_blank">Download PDF</a></div>"#
            )
        }
        Some(Notice::Error(message)) => format!(
            r#"<div class="notice notice-error" role="alert">{}</div>"#,
            escape_html(message)
        ),
        None => String::new(),
    };

    format!(
        r#"<div id="contract-form-container">
{notice_html}
<form id="contract-form" method="post" action="/api/contracts/generate" enctype="multipart/form-data">
  <label for="fullname">Full name</label>
  <input type="text" id="fullname" name="fullname" maxlength="200" required value="{fullname}">
  <label for="email">Email</label>
  <input type="email" id="email" name="email" required value="{email}">
  <label for="date">Date</label>
  <input type="date" id="date" name="date" required value="{date}">
  <fieldset>
    <legend>Signature</legend>
    <label for="signatureUpload">Upload an image</label>
    <input type="file" id="signatureUpload" name="signatureUpload" accept="image/png,image/jpeg,image/gif">
    <p>or draw it below</p>
    <canvas id="signature-pad" width="400" height="150"></canvas>
    <input type="hidden" id="signatureData" name="signatureData" value="">
    <button type="button" id="signature-clear">Clear</button>
  </fieldset>
  <button type="submit">Sign contract</button>
</form>
</div>
"#,
        fullname = escape_html(&values.fullname),
        email = escape_html(&values.email),
        date = escape_html(&values.date),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_form_has_no_notice() {
        let html = render_form(&FormValues::default(), None);
        assert!(html.contains(r#"name="signatureData""#));
        assert!(html.contains(r#"name="signatureUpload""#));
        assert!(!html.contains("notice"));
    }

    #[test]
    fn echoed_values_are_escaped() {
        let values = FormValues {
            fullname: r#""><script>alert(1)</script>"#.to_string(),
            email: "a@b.c".to_string(),
            date: "2024-05-01".to_string(),
        };
        let html = render_form(&values, Some(&Notice::Error("Email <bad>".to_string())));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&quot;&gt;&lt;script&gt;"));
        assert!(html.contains("Email &lt;bad&gt;"));
        assert!(html.contains(r#"value="2024-05-01""#));
    }

    #[test]
    fn success_links_to_the_download() {
        let notice = Notice::Success {
            contract_id: "20240501093015123456-3f9c1a0b7e2d".to_string(),
        };
        let html = render_form(&FormValues::default(), Some(&notice));
        assert!(html.contains(r#"href="/api/contracts/20240501093015123456-3f9c1a0b7e2d""#));
    }
}
