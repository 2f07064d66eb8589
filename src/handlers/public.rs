use std::sync::Arc;

use narrative::application::collection::{CollectionScope, PostCollection};
use narrative::application::error::AppError;
use narrative::application::feed::{FeedPage, FeedService};
use narrative::application::story::{StoryPage, StoryService};
use narrative::config::{ListArgs, ShowArgs};
use narrative::domain::posts::ProjectionRequest;

use super::Ctx;
use crate::print;

pub async fn list(ctx: &Ctx, args: ListArgs) -> Result<(), AppError> {
    let offset = ctx.settings.site.utc_offset;
    let collection = Arc::new(PostCollection::new(ctx.store.clone(), CollectionScope::Public));
    let feed = FeedService::new(collection, offset);

    let request = ProjectionRequest::new(args.search, args.sort).with_layout(args.layout);
    let page = match feed.initialize().await {
        FeedPage::Posts(_) => feed.render(&request),
        other => other,
    };

    if args.json {
        return print::print_json(&page);
    }

    print::site_header(&ctx.site_settings().await);
    print::feed(&page);
    Ok(())
}

pub async fn show(ctx: &Ctx, args: ShowArgs) -> Result<(), AppError> {
    let service = StoryService::new(ctx.store.clone(), ctx.settings.site.utc_offset);
    let page = service.open(Some(args.slug.as_str())).await;

    if args.json {
        print::print_json(&page)?;
    } else {
        print::story(&page);
    }

    match page {
        StoryPage::Found(_) => Ok(()),
        StoryPage::NotFound => Err(AppError::NotFound),
    }
}
