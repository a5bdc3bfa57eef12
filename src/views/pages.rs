//! Full pages served by the editor handlers.

use super::{escape_html, layout};
use crate::{
    models::{
        form::{FieldKind, FormDescription, FormField, SUBMIT},
        record::MetadataRecord,
    },
    services::ownership::OwnedListing,
};
use axum::http::StatusCode;

/// Render the editing form. Values in `form` are already escaped.
pub fn render_form(form: &FormDescription) -> String {
    let mut html = String::from(r#"<form action="edit" method="post">"#);
    for hidden in &form.hidden {
        html.push_str(&format!(
            r#"<input type="hidden" name="{}" value="{}" />"#,
            hidden.name, hidden.value
        ));
    }

    html.push_str(r#"<div id="tabdiv"><ul>"#);
    for section in &form.sections {
        html.push_str(&format!(
            r##"<li><a href="#{}">{}</a></li>"##,
            section.id, section.title
        ));
    }
    html.push_str("</ul>");

    for section in &form.sections {
        html.push_str(&format!(
            r#"<div id="{}"><table class="formtable">"#,
            section.id
        ));
        for field in &section.fields {
            html.push_str(&render_row(field));
        }
        html.push_str("</table></div>");
    }

    html.push_str(&format!(
        r#"</div><input type="submit" name="{SUBMIT}" value="Save" /></form>"#
    ));
    html
}

fn render_row(field: &FormField) -> String {
    let data = match field.kind {
        FieldKind::Text => format!(
            r#"<input type="text" size="60" name="{}" value="{}" />"#,
            field.name, field.value
        ),
        FieldKind::TextArea => format!(
            r#"<textarea name="{}" rows="5" cols="50">{}</textarea>"#,
            field.name, field.value
        ),
        FieldKind::ReadOnly | FieldKind::ReadOnlyDate => field.value.clone(),
    };
    format!(
        r#"<tr><td class="name">{}</td><td class="data">{}</td></tr>"#,
        field.label, data
    )
}

pub fn edit_page(form: &FormDescription) -> String {
    layout(
        "Metadata registry",
        &format!(r#"{}<p><a href="./">Back to the list</a></p>"#, render_form(form)),
    )
}

/// List of the user's own entries (editable) followed by everyone else's.
pub fn list_page(user_id: &str, listing: &OwnedListing) -> String {
    let mut body = format!(
        "<p>Logged in as <strong>{}</strong></p>",
        escape_html(user_id)
    );

    body.push_str("<h2>Your entries</h2>");
    if listing.mine.is_empty() {
        body.push_str("<p>No entries registered.</p>");
    } else {
        body.push_str(r#"<table class="metalist">"#);
        for record in &listing.mine {
            let entity_id = escape_html(record.entityid.as_deref().unwrap_or(""));
            body.push_str(&format!(
                concat!(
                    "<tr><td>{name}</td><td><tt>{entity_id}</tt></td><td>",
                    r#"<form action="edit" method="get">"#,
                    r#"<input type="hidden" name="entityid" value="{entity_id}" />"#,
                    r#"<input type="submit" value="edit" /></form>"#,
                    r#"<form action="./" method="get">"#,
                    r#"<input type="hidden" name="delete" value="{entity_id}" />"#,
                    r#"<input type="submit" value="delete" /></form>"#,
                    "</td></tr>"
                ),
                name = display_name(record),
                entity_id = entity_id
            ));
        }
        body.push_str("</table>");
    }
    body.push_str(concat!(
        r#"<p><a href="edit">Add new entry</a> | "#,
        r#"<a href="import">Add from SAML 2.0 metadata</a></p>"#
    ));

    body.push_str("<h2>Entries owned by others</h2>");
    if listing.others.is_empty() {
        body.push_str("<p>No entries registered.</p>");
    } else {
        body.push_str(r#"<table class="metalist">"#);
        for record in &listing.others {
            body.push_str(&format!(
                "<tr><td>{}</td><td><tt>{}</tt></td><td>{}</td></tr>",
                display_name(record),
                escape_html(record.entityid.as_deref().unwrap_or("")),
                record
                    .owner
                    .as_deref()
                    .map(escape_html)
                    .unwrap_or_else(|| "No owner".into())
            ));
        }
        body.push_str("</table>");
    }

    layout("Metadata registry", &body)
}

fn display_name(record: &MetadataRecord) -> String {
    record
        .name
        .clone()
        .and_then(|name| name.into_english())
        .or_else(|| record.entityid.clone())
        .map(|name| escape_html(&name))
        .unwrap_or_default()
}

pub fn saved_page() -> String {
    layout(
        "Metadata saved",
        r#"<p>The metadata entry was saved.</p><p><a href="./">Back to the list</a></p>"#,
    )
}

/// Page for bootstrapping an entry from an externally parsed descriptor.
pub fn import_page() -> String {
    layout(
        "Import metadata",
        concat!(
            "<p>Paste the parsed SAML 2.0 service provider descriptor (JSON).</p>",
            r#"<form action="edit" method="post">"#,
            r#"<textarea name="metadata" rows="20" cols="80"></textarea><br />"#,
            r#"<input type="submit" value="Parse" /></form>"#,
            r#"<p><a href="./">Back to the list</a></p>"#
        ),
    )
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    layout(
        "Error",
        &format!(
            "<p><strong>{}</strong></p><p>{}</p>",
            status.as_u16(),
            escape_html(message)
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{editor::meta_to_form, ownership::partition_by_owner};

    #[test]
    fn form_posts_back_with_carry_over_and_save_button() {
        let mut record = MetadataRecord::owned_by("alice");
        record.entityid = Some("https://sp.example.org".into());
        let html = render_form(&meta_to_form(&record));

        assert!(html.starts_with(r#"<form action="edit" method="post">"#));
        assert!(html.contains(
            r#"<input type="hidden" name="was-entityid" value="https://sp.example.org" />"#
        ));
        assert!(html.contains(r#"<textarea name="field_description" rows="5" cols="50"></textarea>"#));
        assert!(html.contains(r#"<input type="submit" name="submit" value="Save" />"#));
    }

    #[test]
    fn list_escapes_values_from_other_owners() {
        let record = MetadataRecord {
            entityid: Some("<script>".into()),
            owner: Some("bob & co".into()),
            ..MetadataRecord::default()
        };
        let html = list_page("alice", &partition_by_owner(vec![record], "alice"));

        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("bob &amp; co"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn error_page_shows_status_and_escaped_message() {
        let html = error_page(StatusCode::FORBIDDEN, "not <yours>");
        assert!(html.contains("403"));
        assert!(html.contains("not &lt;yours&gt;"));
    }
}
