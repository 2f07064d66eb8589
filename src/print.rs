use serde::Serialize;

use narrative::application::admin::posts::{AdminListPage, PostForm};
use narrative::application::error::AppError;
use narrative::application::feed::FeedPage;
use narrative::application::story::StoryPage;
use narrative::domain::entities::SiteSettingsRecord;
use narrative::domain::posts::LayoutMode;
use narrative::presentation::views::{PostCard, StoryLink};

pub fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::unexpected(format!("failed to render output: {e}")))?;
    println!("{out}");
    Ok(())
}

pub fn site_header(settings: &SiteSettingsRecord) {
    println!("{}", settings.site_title);
    println!("by {}", settings.site_author);
    println!();
}

pub fn feed(page: &FeedPage) {
    match page {
        FeedPage::Loading => println!("Loading..."),
        FeedPage::Empty { message }
        | FeedPage::NoMatches { message }
        | FeedPage::Error { message } => println!("{message}"),
        FeedPage::Posts(view) => match view.layout {
            LayoutMode::List => view.cards.iter().for_each(list_card),
            LayoutMode::Grid => view.cards.iter().for_each(grid_card),
        },
    }
}

fn list_card(card: &PostCard) {
    println!("{}", card.title);
    println!("  {}  {}", card.published, card.href);
    if !card.preview.is_empty() {
        println!("  {}", card.preview);
    }
    println!();
}

fn grid_card(card: &PostCard) {
    println!("{:<14} {}", card.published, card.title);
}

pub fn story(page: &StoryPage) {
    let StoryPage::Found(detail) = page else {
        println!("Story not found.");
        return;
    };

    println!("{}", detail.published);
    println!("{}", detail.title);
    if let Some(cover) = detail.cover_image_url.as_deref() {
        println!("[cover] {cover}");
    }
    println!();
    println!("{}", detail.content);
    println!();
    print_link("Previous", detail.previous.as_ref());
    print_link("Next", detail.next.as_ref());
}

fn print_link(label: &str, link: Option<&StoryLink>) {
    if let Some(link) = link {
        println!("{label}: {} ({})", link.title, link.href);
    }
}

pub fn admin_list(page: &AdminListPage) {
    match page {
        AdminListPage::Empty { message } | AdminListPage::Error { message } => {
            println!("{message}")
        }
        AdminListPage::Rows { rows } => {
            for row in rows {
                println!("{}  {:<28} {}", row.id, row.status_label, row.title);
            }
        }
    }
}

pub fn post_form(form: &PostForm) {
    println!("id:        {}", form.id);
    println!("title:     {}", form.title);
    println!("slug:      {}", form.slug);
    println!("date:      {}", form.date);
    println!("published: {}", form.published);
    if let Some(cover) = form.cover_image_url.as_deref() {
        println!("cover:     {cover}");
    }
    println!();
    println!("{}", form.content);
}

pub fn site_settings(settings: &SiteSettingsRecord) {
    println!("title:  {}", settings.site_title);
    println!("author: {}", settings.site_author);
    println!(
        "hero:   {}",
        settings.hero_image_url.as_deref().unwrap_or("(none)")
    );
}
