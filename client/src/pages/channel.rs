//! A channel's public page: its videos, about tab and community posts.

use crate::api::{ApiClient, ApiError, Channel, LikeStatus, LikeTarget, Tweet, User, Video};
use crate::reconcile::{ListView, Reconciliation, ToggleState, mutate_then_reconcile};
use std::cmp::Reverse;
use tokio::task::JoinSet;
use tracing::instrument;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelTab {
    #[default]
    Videos,
    About,
    Community,
}

/// Order of the videos tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VideoSort {
    /// Newest upload first.
    #[default]
    Latest,
    /// Most views first.
    Popular,
    Oldest,
}

/// Fetches a user's tweets and fills in the viewer's like state for each of them.
///
/// Like checks run concurrently. A tweet whose check fails is shown as not liked with no
/// likes rather than failing the whole list.
async fn tweets_with_likes(api: &ApiClient, user_id: &str) -> Result<Vec<Tweet>, ApiError> {
    let tweets = api.user_tweets(user_id).await?;

    let mut checks = JoinSet::new();
    for (index, tweet) in tweets.iter().enumerate() {
        let api = api.clone();
        let tweet_id = tweet.id.clone();
        checks.spawn(async move { (index, api.check_tweet_like(&tweet_id).await) });
    }

    let mut statuses = vec![LikeStatus::default(); tweets.len()];
    while let Some(joined) = checks.join_next().await {
        match joined {
            Ok((index, Ok(status))) => statuses[index] = status,
            Ok((index, Err(e))) => {
                tracing::debug!(tweet_id = %tweets[index].id, error = %e, "like check failed");
            }
            Err(e) => tracing::warn!(error = %e, "like check task failed"),
        }
    }

    Ok(tweets
        .into_iter()
        .zip(statuses)
        .map(|(tweet, status)| tweet.with_like_status(status))
        .collect())
}

/// State of a channel page.
#[derive(Debug)]
pub struct ChannelController {
    api: ApiClient,
    channel: Option<Channel>,
    error: Option<String>,
    loading: bool,
    subscription: ToggleState,
    action_error: Option<String>,
    tweets: ListView<Tweet>,
    tab: ChannelTab,
    sort: VideoSort,
}

impl ChannelController {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            channel: None,
            error: None,
            loading: false,
            subscription: ToggleState::default(),
            action_error: None,
            tweets: ListView::new(),
            tab: ChannelTab::default(),
            sort: VideoSort::default(),
        }
    }

    /// Loads the channel and its community posts.
    ///
    /// The selected tab and sort order carry over to a different channel; its posts do not.
    #[instrument(skip(self))]
    pub async fn load(&mut self, channel_id: &str) {
        if self
            .channel
            .as_ref()
            .is_none_or(|c| c.owner.id != channel_id)
        {
            *self = Self {
                tab: self.tab,
                sort: self.sort,
                ..Self::new(self.api.clone())
            };
        }
        self.loading = true;
        match self.api.channel(channel_id).await {
            Ok(channel) => {
                self.subscription =
                    ToggleState::new(channel.is_subscribed, channel.subscribers_count);
                self.channel = Some(channel);
                self.error = None;
                self.tweets
                    .load(tweets_with_likes(&self.api, channel_id))
                    .await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load channel");
                self.channel = None;
                self.error = Some("Failed to load channel data".to_string());
            }
        }
        self.loading = false;
    }

    pub fn channel(&self) -> Option<&Channel> {
        self.channel.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn subscription(&self) -> ToggleState {
        self.subscription
    }

    pub fn action_error(&self) -> Option<&str> {
        self.action_error.as_deref()
    }

    pub fn tweets(&self) -> &ListView<Tweet> {
        &self.tweets
    }

    pub fn tab(&self) -> ChannelTab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: ChannelTab) {
        self.tab = tab;
    }

    pub fn sort(&self) -> VideoSort {
        self.sort
    }

    pub fn set_sort(&mut self, sort: VideoSort) {
        self.sort = sort;
    }

    /// Whether `viewer` owns this channel, and so may post to it.
    pub fn is_owned_by(&self, viewer: Option<&User>) -> bool {
        match (&self.channel, viewer) {
            (Some(channel), Some(viewer)) => channel.owner.id == viewer.id,
            _ => false,
        }
    }

    /// The channel's videos in the selected order.
    pub fn sorted_videos(&self) -> Vec<&Video> {
        let Some(channel) = &self.channel else {
            return Vec::new();
        };
        let mut videos: Vec<&Video> = channel.videos.iter().collect();
        match self.sort {
            VideoSort::Latest => videos.sort_by_key(|v| Reverse(v.created_at)),
            VideoSort::Oldest => videos.sort_by_key(|v| v.created_at),
            VideoSort::Popular => videos.sort_by_key(|v| Reverse(v.views)),
        }
        videos
    }

    fn channel_id(&self) -> Result<String, ApiError> {
        self.channel
            .as_ref()
            .map(|c| c.owner.id.clone())
            .ok_or_else(|| ApiError::local("no channel loaded"))
    }

    /// Subscribes to or unsubscribes from the channel once the server confirms.
    #[instrument(skip(self))]
    pub async fn toggle_subscribe(&mut self) {
        let result = match self.channel_id() {
            Ok(id) => {
                self.subscription
                    .toggle(self.api.toggle_subscription(&id))
                    .await
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => self.action_error = None,
            Err(e) => {
                tracing::warn!(error = %e, "subscription toggle failed");
                self.action_error = Some(e.message);
            }
        }
    }

    /// Runs a tweet mutation and reloads the tweet list after it.
    async fn mutate_tweets<M>(&mut self, mutation: M) -> bool
    where
        M: Future<Output = Result<(), ApiError>>,
    {
        let Ok(channel_id) = self.channel_id() else {
            return false;
        };
        let api = &self.api;
        mutate_then_reconcile(
            &mut self.tweets,
            mutation,
            |(), _| Reconciliation::Refetch,
            async || tweets_with_likes(api, &channel_id).await,
        )
        .await
    }

    /// Posts to the channel. Blank posts are ignored.
    #[instrument(skip(self, content))]
    pub async fn create_tweet(&mut self, content: &str) -> bool {
        if content.trim().is_empty() {
            return false;
        }
        let api = self.api.clone();
        self.mutate_tweets(api.create_tweet(content)).await
    }

    /// Replaces a post's text. Blank edits are ignored.
    #[instrument(skip(self, content))]
    pub async fn edit_tweet(&mut self, tweet_id: &str, content: &str) -> bool {
        if content.trim().is_empty() {
            return false;
        }
        let api = self.api.clone();
        self.mutate_tweets(api.edit_tweet(tweet_id, content)).await
    }

    #[instrument(skip(self))]
    pub async fn delete_tweet(&mut self, tweet_id: &str) -> bool {
        let api = self.api.clone();
        self.mutate_tweets(api.delete_tweet(tweet_id)).await
    }

    /// Likes or unlikes a post, then reloads the list for the confirmed counts.
    #[instrument(skip(self))]
    pub async fn toggle_tweet_like(&mut self, tweet_id: &str) -> bool {
        let api = self.api.clone();
        self.mutate_tweets(async move {
            api.toggle_like(LikeTarget::Tweet, tweet_id).await?;
            Ok::<(), ApiError>(())
        })
        .await
    }
}
