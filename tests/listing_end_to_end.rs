use std::sync::Arc;

use narrative::application::collection::{CollectionScope, PostCollection};
use narrative::application::feed::{FeedPage, FeedService};
use narrative::application::repos::{PostsRepo, PostsWriteRepo};
use narrative::application::story::{StoryPage, StoryService};
use narrative::domain::entities::PostDocument;
use narrative::domain::posts::{ProjectionRequest, SortOrder, project};
use narrative::infra::store::JsonStore;
use time::{OffsetDateTime, UtcOffset, macros::datetime};

fn document(title: &str, content: &str, date: OffsetDateTime, published: bool) -> PostDocument {
    PostDocument {
        title: title.to_string(),
        slug: title.to_lowercase().replace(' ', "-"),
        content: content.to_string(),
        date,
        published,
        cover_image_url: None,
    }
}

async fn seeded_store(path: &std::path::Path) -> Arc<JsonStore> {
    let store = JsonStore::open(path).await.expect("open store");
    let seed = [
        document("Alpha Trip", "Sand and sea.", datetime!(2024-05-01 0:00 UTC), true),
        document("Beta Market", "Stalls at dawn.", datetime!(2024-05-03 0:00 UTC), true),
        document("Gamma Walk", "A long path.", datetime!(2024-05-02 0:00 UTC), true),
        document("Hidden Draft", "a secret", datetime!(2024-05-04 0:00 UTC), false),
    ];
    for doc in seed {
        store.create_post(doc).await.expect("seed post");
    }
    Arc::new(store)
}

fn titles(page: &FeedPage) -> Vec<String> {
    match page {
        FeedPage::Posts(view) => view.cards.iter().map(|card| card.title.clone()).collect(),
        other => panic!("expected posts, got {other:?}"),
    }
}

#[tokio::test]
async fn published_listing_filters_sorts_and_never_leaks_drafts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("narrative.json");
    seeded_store(&path).await;

    // Reopen so the listing runs against what was persisted.
    let store = Arc::new(JsonStore::open(&path).await.expect("reopen"));
    let published = store.fetch_published().await.expect("fetch");
    let projected: Vec<_> = project(&published, "a", SortOrder::NewFirst)
        .into_iter()
        .map(|post| post.title.as_str())
        .collect();
    assert_eq!(projected, ["Beta Market", "Gamma Walk", "Alpha Trip"]);

    let collection = Arc::new(PostCollection::new(store.clone(), CollectionScope::Public));
    let feed = FeedService::new(collection, UtcOffset::UTC);
    let first = feed.initialize().await;
    assert_eq!(titles(&first), ["Beta Market", "Gamma Walk", "Alpha Trip"]);

    for order in [SortOrder::NewFirst, SortOrder::OldFirst] {
        for search in ["", "a", "secret", "hidden"] {
            let page = feed.render(&ProjectionRequest::new(search, order));
            if let FeedPage::Posts(view) = page {
                assert!(view.cards.iter().all(|card| card.title != "Hidden Draft"));
            }
        }
    }

    let oldest_first = feed.render(&ProjectionRequest::new("", SortOrder::OldFirst));
    assert_eq!(titles(&oldest_first), ["Alpha Trip", "Gamma Walk", "Beta Market"]);
}

#[tokio::test]
async fn detail_page_navigates_chronologically_and_hides_drafts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = seeded_store(&dir.path().join("narrative.json")).await;
    let stories = StoryService::new(store, UtcOffset::UTC);

    let StoryPage::Found(detail) = stories.open(Some("gamma-walk")).await else {
        panic!("gamma walk should be published");
    };
    assert_eq!(detail.published, "MAY 2, 2024");
    assert_eq!(
        detail.previous.map(|link| link.href),
        Some("story.html?slug=alpha-trip".to_string())
    );
    assert_eq!(
        detail.next.map(|link| link.href),
        Some("story.html?slug=beta-market".to_string())
    );

    let StoryPage::Found(last) = stories.open(Some("beta-market")).await else {
        panic!("beta market should be published");
    };
    assert!(last.next.is_none(), "drafts must not become the next story");

    assert_eq!(stories.open(Some("hidden-draft")).await, StoryPage::NotFound);
}
