// src/share/caption.rs
//! Deterministic share caption. Built before (and independently of) any
//! image work so a text-only share always has a complete payload.

use crate::card::ShareRequest;

/// Fixed template: category, quoted title, lead paragraph, time, author,
/// canonical link, reference code, signature.
pub fn build(request: &ShareRequest, reference_code: &str, canonical_url: &str) -> String {
    format!(
        "🔴 *NOTICIA: {category}*\n\n\"{title}\"\n\n{lead}\n\n🕒 *HORA:* {time}\n✍️ *SUBIDO POR:* {author}\n\n🔗 *VER MÁS:* {link}\n🆔 *REF-ID:* {code}\n\n_Enviado vía CDLT NEWS_",
        category = request.category,
        title = request.title,
        lead = request.lead_paragraph,
        time = request.time_label,
        author = request.author,
        link = canonical_url,
        code = reference_code,
    )
}
