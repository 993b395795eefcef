use std::fmt::Write as _;

use marquee_core::discovery::{DiscoverySnapshot, ListSnapshot};
use marquee_core::session::AuthState;
use marquee_model::{FilterSnapshot, Keyword, MediaListItem};

pub fn auth_state(state: &AuthState) -> String {
    match state {
        AuthState::Unknown => "unknown".to_string(),
        AuthState::Unauthenticated => "signed out".to_string(),
        AuthState::Authenticated { expiry: Some(at) } => {
            format!("signed in (cookie expires {})", at.to_rfc3339())
        }
        AuthState::Authenticated { expiry: None } => "signed in".to_string(),
    }
}

pub fn filters(filters: &FilterSnapshot) -> String {
    let join = |ids: Vec<String>| {
        if ids.is_empty() {
            "any".to_string()
        } else {
            ids.join(", ")
        }
    };
    let keywords: Vec<String> =
        filters.active_keywords.iter().map(|k| k.name.clone()).collect();
    format!(
        "kind: {}  providers: {}  genres: {}  keywords: {}",
        filters.selected_media_kind,
        join(filters.selected_provider_ids.iter().map(|id| id.to_string()).collect()),
        join(filters.selected_genre_ids.iter().map(|id| id.to_string()).collect()),
        join(keywords),
    )
}

pub fn titles(heading: &str, items: &[MediaListItem], has_more: bool) -> String {
    let mut out = format!("{heading} ({})\n", items.len());
    for item in items {
        let _ = writeln!(
            out,
            "  {:>8}  {:<5}  {}",
            item.id.get(),
            item.media_kind.as_str(),
            item.title
        );
    }
    if has_more && !items.is_empty() {
        out.push_str("  ...\n");
    }
    out
}

pub fn keywords(items: &[Keyword]) -> String {
    let mut out = format!("Keywords ({})\n", items.len());
    for keyword in items {
        let _ = writeln!(out, "  {:>8}  {}", keyword.id.get(), keyword.name);
    }
    out
}

fn list(heading: &str, list: &ListSnapshot<MediaListItem>) -> String {
    titles(heading, &list.items, list.has_more)
}

fn error_line(out: &mut String, error: Option<&String>) {
    if let Some(error) = error {
        let _ = writeln!(out, "  ! {error}");
    }
}

pub fn snapshot(snapshot: &DiscoverySnapshot, with_follow_ups: bool) -> String {
    let mut out = String::new();
    out.push_str(&list("Results", &snapshot.primary));
    error_line(&mut out, snapshot.primary_error.as_ref());

    if with_follow_ups {
        out.push('\n');
        out.push_str(&keywords(&snapshot.keyword_suggestions.items));
        error_line(&mut out, snapshot.keywords_error.as_ref());

        if let Some(seed) = snapshot.seed {
            out.push('\n');
            let _ = writeln!(out, "Recommended for {} {}", seed.kind, seed.id);
            out.push_str(&list("Movies", &snapshot.movie_recommendations));
            out.push_str(&list("TV", &snapshot.tv_recommendations));
            error_line(&mut out, snapshot.recommendations_error.as_ref());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_model::{MediaKind, MediaRef};

    fn item(id: u64, title: &str) -> MediaListItem {
        MediaListItem::new(id, title, MediaKind::Movie)
    }

    #[test]
    fn empty_filters_read_as_any() {
        let text = filters(&FilterSnapshot::default());
        assert_eq!(
            text,
            "kind: movie  providers: any  genres: any  keywords: any"
        );
    }

    #[test]
    fn snapshot_lists_errors_and_recommendations() {
        let mut snap = DiscoverySnapshot::default();
        snap.primary.items = vec![item(1, "Heat"), item(2, "Ronin")];
        snap.primary.has_more = false;
        snap.seed = Some(MediaRef {
            id: 1.into(),
            kind: MediaKind::Movie,
        });
        snap.recommendations_error =
            Some("Couldn't load TV recommendations: timeout".into());

        let text = snapshot(&snap, true);

        assert!(text.starts_with("Results (2)\n"));
        assert!(text.contains("Heat"));
        assert!(text.contains("Recommended for movie 1"));
        assert!(text.contains("! Couldn't load TV recommendations: timeout"));
        assert!(!text.contains("..."));
    }
}
