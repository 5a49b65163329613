//! Lazy pagination over a single-call binding.
//!
//! A [`Cursor`] is consumed into a stream; restarting means asking the
//! binding for a new cursor.
use async_stream::try_stream;
use futures::{Stream, StreamExt, pin_mut};

use crate::args::CallArgs;
use crate::binder::Api;
use crate::descriptor::{EndpointDescriptor, Pagination};
use crate::error::Result;
use crate::parser::{Paginated, Parser};

type ItemOf<P> = <<P as Parser>::Output as Paginated>::Item;

pub struct Cursor<'a, P: Parser> {
    api: &'a Api<P>,
    desc: EndpointDescriptor,
    args: CallArgs,
    start: Option<i64>,
}

impl<P: Parser> std::fmt::Debug for Cursor<'_, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("path", &self.desc.path)
            .field("pagination", &self.desc.pagination)
            .field("start", &self.start)
            .finish_non_exhaustive()
    }
}

impl<'a, P> Cursor<'a, P>
where
    P: Parser,
    P::Output: Paginated,
{
    pub(crate) fn new(api: &'a Api<P>, desc: EndpointDescriptor, args: CallArgs) -> Self {
        Self {
            api,
            desc,
            args,
            start: None,
        }
    }

    /// First page number (default 1) or cursor token (default 0) to request.
    pub fn starting_at(mut self, start: i64) -> Self {
        self.start = Some(start);
        self
    }

    /// One element per response. Stops after `limit` pages; 0 means no limit.
    ///
    /// Page-number mode ends on the first empty page (which is not yielded).
    /// Cursor mode ends once `next_cursor` is 0 or missing.
    pub fn pages(self, limit: usize) -> impl Stream<Item = Result<Vec<ItemOf<P>>>> + 'a {
        let Cursor {
            api,
            desc,
            mut args,
            start,
        } = self;

        try_stream! {
            let mut fetched = 0usize;
            match desc.pagination {
                Pagination::PageNumber => {
                    let mut page = start.unwrap_or(1);
                    while limit == 0 || fetched < limit {
                        args.set_param("page", page);
                        let chunk = api.call(&desc, args.clone()).await?.into_page();
                        if chunk.items.is_empty() {
                            break;
                        }
                        fetched += 1;
                        yield chunk.items;
                        page += 1;
                    }
                }
                Pagination::Cursor => {
                    let mut token = start.unwrap_or(0);
                    while limit == 0 || fetched < limit {
                        args.set_param("cursor", token);
                        let chunk = api.call(&desc, args.clone()).await?.into_page();
                        fetched += 1;
                        let next = chunk.next_cursor;
                        yield chunk.items;
                        match next {
                            Some(n) if n != 0 => token = n,
                            _ => break,
                        }
                    }
                }
                Pagination::None => {}
            }
            tracing::debug!(path = desc.path, pages = fetched, "cursor.done");
        }
    }

    /// Items flattened across pages. Stops after `limit` items; 0 means no
    /// limit.
    pub fn items(self, limit: usize) -> impl Stream<Item = Result<ItemOf<P>>> + 'a {
        try_stream! {
            let pages = self.pages(0);
            pin_mut!(pages);
            let mut yielded = 0usize;
            'pages: while let Some(page) = pages.next().await {
                for item in page? {
                    yield item;
                    yielded += 1;
                    if limit > 0 && yielded >= limit {
                        break 'pages;
                    }
                }
            }
        }
    }
}
