//! Plain-text email composition.
//!
//! One builder per [`RequestKind`]. Every interpolated value goes through
//! [`escape_html`], including the metadata block.

use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};

use super::types::{
    quote_detail_lines, InterventionDetails, RawSubmission, RequestKind, SanitizedFields,
};
use crate::guard::escape_html;

const SUBJECT_PREFIX: &str = "[HD Connect - Demande] ";
const BODY_PREAMBLE: &str = "Nouvelle demande reçue via le formulaire du site.\n\n";

/// Request context appended to every email.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub client_ip: String,
    pub origin: Option<String>,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedEmail {
    pub subject: String,
    pub body: String,
}

/// Escape `value`, or `fallback` when the field is empty.
fn safe(value: &str, fallback: &str) -> String {
    escape_html(if value.is_empty() { fallback } else { value })
}

pub fn compose(fields: &SanitizedFields, raw: &RawSubmission, meta: &RequestMeta) -> ComposedEmail {
    let mut body = String::from(BODY_PREAMBLE);

    let title = match fields.kind() {
        RequestKind::Quote => compose_quote(&mut body, fields, raw),
        RequestKind::Intervention => compose_intervention(&mut body, fields, raw),
        RequestKind::Generic => compose_generic(&mut body, fields),
    };

    write_metadata(&mut body, meta);

    ComposedEmail {
        subject: format!("{SUBJECT_PREFIX}{title}"),
        body,
    }
}

fn compose_quote(body: &mut String, fields: &SanitizedFields, raw: &RawSubmission) -> String {
    let service = safe(&fields.selected_service, "Devis Général");

    body.push_str("--- Demande de Devis ---\n");
    let _ = writeln!(body, "Service: {service}\n");

    if let Some(details) = raw.quote_details() {
        body.push_str("--- Détails du Projet ---\n");
        for (key, value) in quote_detail_lines(details) {
            let _ = writeln!(body, "{}: {}", escape_html(&key), escape_html(&value));
        }
        body.push('\n');
    }

    write_client_header(body, fields);
    let _ = writeln!(body, "Période souhaitée: {}", safe(&fields.timeline, "N/A"));
    let _ = writeln!(body, "Budget: {}", safe(&fields.budget, "Non spécifié"));
    let _ = writeln!(body, "Message: {}", safe(&fields.message, "Aucun"));

    format!("Devis: {service}")
}

fn compose_intervention(
    body: &mut String,
    fields: &SanitizedFields,
    raw: &RawSubmission,
) -> String {
    let problem = safe(&fields.selected_problem, "Intervention Générale");

    body.push_str("--- Demande d'Intervention ---\n");
    let _ = writeln!(body, "Type de Problème: {problem}");

    if let Some(data) = raw.intervention() {
        let details = InterventionDetails::from_map(data);
        body.push_str("--- Détails du Problème ---\n");
        let _ = writeln!(body, "Description: {}", safe(&details.description, "N/A"));
        let _ = writeln!(body, "Fonctionnait avant: {}", safe(&details.worked_before, "N/A"));
        let _ = writeln!(body, "Lieu: {}", safe(&details.location_type, "N/A"));
        let _ = writeln!(body, "Urgence: {}\n", safe(&fields.urgency, "N/A"));
    }

    write_client_header(body, fields);
    let _ = writeln!(body, "Message: {}", safe(&fields.message, "Aucun"));

    format!("Intervention: {problem}")
}

fn compose_generic(body: &mut String, fields: &SanitizedFields) -> String {
    body.push_str("--- Demande de Contact ---\n");
    let _ = writeln!(body, "Service: {}", safe(&fields.selected_service, "N/A"));
    let _ = writeln!(body, "Problème: {}\n", safe(&fields.selected_problem, "N/A"));

    write_client_header(body, fields);
    let _ = writeln!(body, "Période souhaitée: {}", safe(&fields.timeline, "N/A"));
    let _ = writeln!(body, "Budget: {}", safe(&fields.budget, "Non spécifié"));
    let _ = writeln!(body, "Description: {}", safe(&fields.description, "Aucune"));
    let _ = writeln!(body, "Urgence: {}", safe(&fields.urgency, "N/A"));
    let _ = writeln!(body, "Message: {}", safe(&fields.message, "Aucun"));

    "Demande de contact".to_string()
}

/// Contact lines shared by all three templates.
fn write_client_header(body: &mut String, fields: &SanitizedFields) {
    body.push_str("--- Informations Client ---\n");
    let _ = writeln!(body, "Nom: {}", safe(&fields.name, "N/A"));
    let _ = writeln!(body, "Téléphone: {}", safe(&fields.phone, "N/A"));
    let _ = writeln!(body, "Email: {}", safe(&fields.email, "N/A"));
    let _ = writeln!(body, "Adresse (Ville/CP): {}", safe(&fields.address, "N/A"));
}

fn write_metadata(body: &mut String, meta: &RequestMeta) {
    body.push_str("\n--- Métadonnées ---\n");
    let _ = writeln!(body, "IP Client: {}", escape_html(&meta.client_ip));
    let _ = writeln!(
        body,
        "Date: {}",
        meta.received_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    );
    let _ = writeln!(
        body,
        "Origine: {}",
        safe(meta.origin.as_deref().unwrap_or_default(), "Inconnue")
    );
}
