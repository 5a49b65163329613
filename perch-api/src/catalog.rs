//! A representative set of bindings.
//!
//! Each constant is plain configuration; call them through [`Api::bind`] or
//! [`Api::call`]. A few helpers below cover bindings whose arguments need
//! preparation (image uploads, identifier lists).
use std::path::Path;

use crate::args::{CallArgs, list_to_csv};
use crate::binder::Api;
use crate::descriptor::{EndpointDescriptor, Pagination, PayloadKind};
use crate::error::Result;
use crate::multipart::{BACKGROUND_IMAGE_MAX_KB, PROFILE_IMAGE_MAX_KB, pack_image};
use crate::parser::Parser;

// timelines

pub const PUBLIC_TIMELINE: EndpointDescriptor =
    EndpointDescriptor::get("/statuses/public_timeline.json")
        .returns_list(PayloadKind::Status)
        .allow(&["include_entities"])
        .paginated(Pagination::PageNumber);

pub const HOME_TIMELINE: EndpointDescriptor =
    EndpointDescriptor::get("/statuses/home_timeline.json")
        .returns_list(PayloadKind::Status)
        .allow(&["since_id", "max_id", "count", "include_entities"])
        .require_auth()
        .paginated(Pagination::PageNumber);

// statuses

pub const GET_STATUS: EndpointDescriptor = EndpointDescriptor::get("/statuses/show/{id}.json")
    .returns(PayloadKind::Status)
    .allow(&["include_entities", "trim_user"]);

pub const UPDATE_STATUS: EndpointDescriptor = EndpointDescriptor::post("/statuses/update.json")
    .returns(PayloadKind::Status)
    .allow(&[
        "status",
        "in_reply_to_status_id",
        "lat",
        "long",
        "source",
        "place_id",
    ])
    .require_auth();

pub const DESTROY_STATUS: EndpointDescriptor =
    EndpointDescriptor::delete("/statuses/destroy/{id}.json")
        .returns(PayloadKind::Status)
        .require_auth();

pub const RETWEET: EndpointDescriptor = EndpointDescriptor::post("/statuses/retweet/{id}.json")
    .returns(PayloadKind::Status)
    .require_auth();

// users and social graph

pub const LOOKUP_USERS: EndpointDescriptor = EndpointDescriptor::get("/users/lookup.json")
    .returns_list(PayloadKind::User)
    .allow(&["user_id", "screen_name", "include_entities"])
    .require_auth();

pub const FRIENDS_IDS: EndpointDescriptor = EndpointDescriptor::get("/friends/ids.json")
    .returns(PayloadKind::Ids)
    .allow(&["id", "user_id", "screen_name"])
    .paginated(Pagination::Cursor);

// probes

pub const VERIFY_CREDENTIALS: EndpointDescriptor =
    EndpointDescriptor::get("/account/verify_credentials.json")
        .returns(PayloadKind::User)
        .require_auth()
        .as_probe();

pub const EXISTS_BLOCK: EndpointDescriptor = EndpointDescriptor::get("/blocks/exists.json")
    .returns(PayloadKind::User)
    .allow(&["id", "user_id", "screen_name"])
    .require_auth()
    .as_probe();

pub const TEST: EndpointDescriptor = EndpointDescriptor::get("/help/test.json").as_probe();

pub const IS_LIST_MEMBER: EndpointDescriptor =
    EndpointDescriptor::get("/{owner}/{slug}/members/{id}.json")
        .returns(PayloadKind::User)
        .as_probe();

// lists

pub const CREATE_LIST: EndpointDescriptor = EndpointDescriptor::post("/{owner}/lists.json")
    .returns(PayloadKind::List)
    .allow(&["name", "mode", "description"])
    .owner_from_auth();

pub const DESTROY_LIST: EndpointDescriptor =
    EndpointDescriptor::delete("/{owner}/lists/{slug}.json")
        .returns(PayloadKind::List)
        .owner_from_auth();

pub const ADD_LIST_MEMBER: EndpointDescriptor =
    EndpointDescriptor::post("/{owner}/{slug}/members.json")
        .returns(PayloadKind::List)
        .allow(&["id"])
        .owner_from_auth();

pub const GET_LIST: EndpointDescriptor = EndpointDescriptor::get("/{owner}/lists/{slug}.json")
    .returns(PayloadKind::List);

pub const LIST_TIMELINE: EndpointDescriptor =
    EndpointDescriptor::get("/{owner}/lists/{slug}/statuses.json")
        .returns_list(PayloadKind::Status)
        .allow(&["since_id", "max_id", "per_page"])
        .paginated(Pagination::PageNumber);

// account

pub const UPDATE_PROFILE_IMAGE: EndpointDescriptor =
    EndpointDescriptor::post("/account/update_profile_image.json")
        .returns(PayloadKind::User)
        .require_auth();

pub const UPDATE_PROFILE_BACKGROUND_IMAGE: EndpointDescriptor =
    EndpointDescriptor::post("/account/update_profile_background_image.json")
        .returns(PayloadKind::User)
        .allow(&["tile"])
        .require_auth();

pub const RATE_LIMIT_STATUS: EndpointDescriptor =
    EndpointDescriptor::get("/account/rate_limit_status.json").returns(PayloadKind::Json);

// search

pub const SEARCH: EndpointDescriptor = EndpointDescriptor::get("/search.json")
    .returns_list(PayloadKind::SearchResult)
    .allow(&[
        "q", "lang", "locale", "rpp", "since_id", "geocode", "show_user",
    ])
    .on_search_host()
    .paginated(Pagination::PageNumber);

pub const ALL: &[EndpointDescriptor] = &[
    PUBLIC_TIMELINE,
    HOME_TIMELINE,
    GET_STATUS,
    UPDATE_STATUS,
    DESTROY_STATUS,
    RETWEET,
    LOOKUP_USERS,
    FRIENDS_IDS,
    VERIFY_CREDENTIALS,
    EXISTS_BLOCK,
    TEST,
    IS_LIST_MEMBER,
    CREATE_LIST,
    DESTROY_LIST,
    ADD_LIST_MEMBER,
    GET_LIST,
    LIST_TIMELINE,
    UPDATE_PROFILE_IMAGE,
    UPDATE_PROFILE_BACKGROUND_IMAGE,
    RATE_LIMIT_STATUS,
    SEARCH,
];

impl<P: Parser> Api<P> {
    /// Upload a new avatar (at most 700 KB).
    pub async fn update_profile_image(&self, image: impl AsRef<Path>) -> Result<P::Output> {
        let packed = pack_image(image, PROFILE_IMAGE_MAX_KB).await?;
        self.call(&UPDATE_PROFILE_IMAGE, CallArgs::new().multipart(packed))
            .await
    }

    /// Upload a background image (at most 800 KB); `tile` is sent in the query.
    pub async fn update_profile_background_image(
        &self,
        image: impl AsRef<Path>,
        tile: Option<bool>,
    ) -> Result<P::Output> {
        let packed = pack_image(image, BACKGROUND_IMAGE_MAX_KB).await?;
        let args = CallArgs::new().param_opt("tile", tile).multipart(packed);
        self.call(&UPDATE_PROFILE_BACKGROUND_IMAGE, args).await
    }

    /// Batch user lookup by numeric id and/or screen name.
    pub async fn lookup_users<I, S>(&self, user_ids: I, screen_names: S) -> Result<P::Output>
    where
        I: IntoIterator<Item = u64>,
        S: IntoIterator,
        S::Item: std::fmt::Display,
    {
        let args = CallArgs::new()
            .param_opt("user_id", list_to_csv(user_ids))
            .param_opt("screen_name", list_to_csv(screen_names));
        self.call(&LOOKUP_USERS, args).await
    }
}
