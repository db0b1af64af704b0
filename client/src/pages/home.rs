//! The home feed and its sidebar sections.

use crate::api::{ApiClient, SubscribedChannel, Video};
use crate::reconcile::ListView;
use tracing::instrument;

/// Videos with more views than this count as trending.
const TRENDING_MIN_VIEWS: u64 = 1000;

/// A sidebar section of the home page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Section {
    #[default]
    Home,
    Trending,
    History,
    Liked,
    WatchLater,
    Music,
    Gaming,
    Sports,
}

impl Section {
    pub const ALL: [Section; 8] = [
        Section::Home,
        Section::Trending,
        Section::History,
        Section::Liked,
        Section::WatchLater,
        Section::Music,
        Section::Gaming,
        Section::Sports,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Home => "Home",
            Section::Trending => "Trending",
            Section::History => "Watch History",
            Section::Liked => "Liked Videos",
            Section::WatchLater => "Watch Later",
            Section::Music => "Music",
            Section::Gaming => "Gaming",
            Section::Sports => "Sports",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Section::Home => "Discover amazing videos from creators worldwide",
            Section::Trending => "The most popular videos right now",
            Section::History => "Continue watching from where you left off",
            Section::Liked => "Videos you've liked and enjoyed",
            Section::WatchLater => "Videos you've saved to watch later",
            Section::Music => "The best music videos and tracks",
            Section::Gaming => "Top gaming content and streams",
            Section::Sports => "Latest sports highlights and events",
        }
    }

    fn keyword(self) -> Option<&'static str> {
        match self {
            Section::Music => Some("music"),
            Section::Gaming => Some("game"),
            Section::Sports => Some("sport"),
            _ => None,
        }
    }

    /// Picks this section's videos out of the full list.
    ///
    /// Only meaningful for sections that are derived locally; history and liked videos come
    /// from their own endpoints.
    fn filter(self, videos: &[Video]) -> Vec<Video> {
        match self {
            Section::Trending => videos
                .iter()
                .filter(|v| v.views > TRENDING_MIN_VIEWS)
                .cloned()
                .collect(),
            // there is no watch-later list on the server yet; show a slice of the feed
            Section::WatchLater => videos.iter().skip(1).take(4).cloned().collect(),
            section => match section.keyword() {
                Some(keyword) => videos
                    .iter()
                    .filter(|v| {
                        v.title.to_lowercase().contains(keyword)
                            || v.description.to_lowercase().contains(keyword)
                    })
                    .cloned()
                    .collect(),
                None => videos.to_vec(),
            },
        }
    }
}

/// State of the home page.
#[derive(Debug)]
pub struct HomeController {
    api: ApiClient,
    videos: ListView<Video>,
    subscriptions: ListView<SubscribedChannel>,
    section: Section,
    shown: ListView<Video>,
}

impl HomeController {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            videos: ListView::new(),
            subscriptions: ListView::new(),
            section: Section::Home,
            shown: ListView::new(),
        }
    }

    /// Fetches the feed and the sidebar's subscribed channels, then fills the current section.
    #[instrument(skip(self))]
    pub async fn load(&mut self) {
        self.videos.load(self.api.list_videos()).await;
        self.subscriptions
            .load(self.api.subscribed_channels())
            .await;
        self.select_section(self.section).await;
    }

    /// Switches to `section`, fetching it if it is not derived from the feed.
    ///
    /// A remote section that fails to load shows nothing rather than another section's
    /// videos; reloading the section already shown keeps its list on failure.
    #[instrument(skip(self))]
    pub async fn select_section(&mut self, section: Section) {
        if self.section != section {
            self.shown.replace_all(Vec::new());
        }
        self.section = section;
        match section {
            Section::History => {
                self.shown.load(self.api.watch_history()).await;
            }
            Section::Liked => {
                self.shown.load(self.api.liked_videos()).await;
            }
            _ => {
                self.shown.replace_all(section.filter(self.videos.items()));
                self.shown.clear_error();
            }
        }
        tracing::debug!(?section, shown = self.shown.len(), "selected section");
    }

    pub fn section(&self) -> Section {
        self.section
    }

    /// The videos of the selected section.
    pub fn shown(&self) -> &ListView<Video> {
        &self.shown
    }

    /// The full feed.
    pub fn videos(&self) -> &ListView<Video> {
        &self.videos
    }

    pub fn subscriptions(&self) -> &ListView<SubscribedChannel> {
        &self.subscriptions
    }

    pub fn is_loading(&self) -> bool {
        self.videos.is_loading() || self.shown.is_loading()
    }

    /// What to show instead of an empty grid.
    pub fn empty_message(&self) -> String {
        if self.section == Section::Home {
            "No videos available yet.".to_string()
        } else {
            format!(
                "No videos found in {}. Try a different section.",
                self.section.title().to_lowercase()
            )
        }
    }
}
