use crate::signature::StoredSignature;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{(fullname|email|date|signature)\}").expect("token pattern is valid")
});

/// Validated form fields merged into a template.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractFields {
    pub fullname: String,
    pub email: String,
    pub date: NaiveDate,
}

/// Substitutes the contract tokens in `template` in a single left-to-right pass.
///
/// Replacement text is never rescanned, so a field whose value is itself a
/// token appears literally. Text fields are HTML-escaped; `${signature}` becomes
/// an inline data URI of the stored signature image.
pub fn render(template: &str, fields: &ContractFields, signature: &StoredSignature) -> String {
    let fullname = escape_html(&fields.fullname);
    let email = escape_html(&fields.email);
    let date = escape_html(&fields.date.format("%Y-%m-%d").to_string());
    let signature = signature.data_uri();

    TOKEN_RE
        .replace_all(template, |caps: &Captures| match &caps[1] {
            "fullname" => fullname.clone(),
            "email" => email.clone(),
            "date" => date.clone(),
            _ => signature.clone(),
        })
        .into_owned()
}

/// Escapes `&`, `<`, `>`, `"` and `'` so the value can be embedded in HTML text or attributes.
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::SignatureHandle;

    fn signature() -> StoredSignature {
        StoredSignature {
            handle: SignatureHandle("sig.png".to_string()),
            bytes: b"\x89PNG\r\n\x1a\n".to_vec(),
            mime: "image/png",
        }
    }

    fn fields(fullname: &str) -> ContractFields {
        ContractFields {
            fullname: fullname.to_string(),
            email: "ada@example.com".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        }
    }

    #[test]
    fn all_tokens_are_substituted() {
        let html = render(
            "<p>${fullname} (${email}) on ${date}</p><img src=\"${signature}\">",
            &fields("Ada Lovelace"),
            &signature(),
        );
        assert_eq!(
            html,
            "<p>Ada Lovelace (ada@example.com) on 2024-05-01</p>\
             <img src=\"data:image/png;base64,iVBORw0KGgo=\">"
        );
    }

    #[test]
    fn repeated_tokens_are_all_replaced() {
        let html = render("${fullname}/${fullname}", &fields("Ada"), &signature());
        assert_eq!(html, "Ada/Ada");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let html = render("<p>${fullname} ${email}</p>", &fields("${email}"), &signature());
        assert_eq!(html, "<p>${email} ada@example.com</p>");

        let html = render("<p>${fullname}</p>", &fields("${fullname}"), &signature());
        assert_eq!(html, "<p>${fullname}</p>");
    }

    #[test]
    fn field_values_are_html_escaped() {
        let html = render(
            "<p>${fullname}</p>",
            &fields("<script>alert('x')</script> & co"),
            &signature(),
        );
        assert_eq!(
            html,
            "<p>&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; co</p>"
        );
    }

    #[test]
    fn unknown_tokens_are_left_alone() {
        let html = render("${company} ${FULLNAME}", &fields("Ada"), &signature());
        assert_eq!(html, "${company} ${FULLNAME}");
    }
}
