//! The request binder: descriptor + arguments in, parsed value out.
//!
//! A call runs validation, path templating, auth, body construction, the
//! retrying executor and the parser, in that order, and stops at the first
//! error. Local failures never reach the transport.
use perch_config::ClientConfig;
use perch_http::{BoundRequest, Executor, HttpMethod, ReqwestTransport, RetryPolicy, Transport};
use std::sync::Arc;
use url::Url;

use crate::args::CallArgs;
use crate::auth::{Authenticator, BearerAuth};
use crate::cache::{MemoryCache, ResponseCache, cache_key};
use crate::cursor::Cursor;
use crate::descriptor::EndpointDescriptor;
use crate::error::{Error, Result};
use crate::parser::{JsonParser, Paginated, Parser};
use crate::template::{encode_params, render_path};
use crate::validate::validate_params;

/// Client entry point. Immutable after construction and cheap to share
/// behind an `Arc`.
pub struct Api<P = JsonParser> {
    config: ClientConfig,
    auth: Option<Arc<dyn Authenticator>>,
    executor: Executor,
    parser: P,
    cache: Option<Arc<dyn ResponseCache>>,
}

impl<P> std::fmt::Debug for Api<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Api")
            .field("config", &self.config)
            .field("authenticated", &self.auth.is_some())
            .field("executor", &self.executor)
            .field("cached", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl Api<JsonParser> {
    /// Production wiring: `reqwest` transport, bearer auth and memory cache
    /// when the config asks for them.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new()?.with_timeout(config.timeout());
        let auth = config
            .auth
            .as_ref()
            .map(BearerAuth::from_settings)
            .transpose()?;
        let cache = config.cache_timeout().map(MemoryCache::new);

        let mut api = Self::with_parts(config, Arc::new(transport), JsonParser);
        if let Some(auth) = auth {
            api = api.with_auth(auth);
        }
        if let Some(cache) = cache {
            api = api.with_cache(cache);
        }
        Ok(api)
    }
}

impl<P: Parser> Api<P> {
    pub fn with_parts(config: ClientConfig, transport: Arc<dyn Transport>, parser: P) -> Self {
        let policy = RetryPolicy::new(
            config.retry_count,
            config.retry_delay(),
            config.retry_errors.iter().copied(),
        );
        Self {
            executor: Executor::new(transport, policy),
            config,
            auth: None,
            parser,
            cache: None,
        }
    }

    pub fn with_auth(mut self, auth: impl Authenticator + 'static) -> Self {
        self.auth = Some(Arc::new(auth));
        self
    }

    pub fn with_cache(mut self, cache: impl ResponseCache + 'static) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn auth(&self) -> Option<&dyn Authenticator> {
        self.auth.as_deref()
    }

    pub fn cache(&self) -> Option<&dyn ResponseCache> {
        self.cache.as_deref()
    }

    /// Pair a descriptor with this client.
    pub fn bind(&self, desc: EndpointDescriptor) -> Binding<'_, P> {
        Binding { api: self, desc }
    }

    fn authenticated(&self) -> Option<&dyn Authenticator> {
        self.auth.as_deref().filter(|a| a.is_authenticated())
    }

    /// Build the signed request for one invocation without sending it.
    pub fn build_request(
        &self,
        desc: &EndpointDescriptor,
        args: &CallArgs,
    ) -> Result<BoundRequest> {
        validate_params(desc, args)?;

        let auth = self.authenticated();
        if desc.requires_auth && auth.is_none() {
            return Err(Error::AuthRequired(desc.path));
        }

        let path = if desc.derived_owner {
            let owner = auth
                .and_then(|a| a.username())
                .ok_or(Error::AuthRequired(desc.path))?;
            let mut values = Vec::with_capacity(args.positional().len() + 1);
            values.push(owner);
            values.extend(args.positional().iter().cloned());
            render_path(desc.path, &values)?
        } else {
            render_path(desc.path, args.positional())?
        };

        let base = self.config.base_url(desc.search_api);
        let mut url = Url::parse(&format!("{base}{path}"))
            .map_err(|e| Error::Url(format!("{base}{path}: {e}")))?;

        let form_body = desc.method == HttpMethod::Post && args.body().is_none();
        if !form_body && !args.named().is_empty() {
            url.query_pairs_mut()
                .extend_pairs(args.named().iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        let mut request = BoundRequest::new(desc.method, url);
        if form_body {
            request = request
                .with_header("Content-Type", "application/x-www-form-urlencoded")
                .with_body(encode_params(args.named()).into_bytes());
        }
        if let Some(body) = args.body() {
            request = request.with_body(body.to_vec());
        }
        for (name, value) in args.headers() {
            request = request.with_header(name.clone(), value.clone());
        }

        match auth {
            Some(auth) => auth.sign(request),
            None => Ok(request),
        }
    }

    /// Invoke the binding once and parse the response.
    pub async fn call(&self, desc: &EndpointDescriptor, args: CallArgs) -> Result<P::Output> {
        let request = self.build_request(desc, &args)?;
        tracing::debug!(
            method = %desc.method,
            path = desc.path,
            search = desc.search_api,
            params = args.named().len(),
            "binder.call"
        );

        let key = match (&self.cache, desc.method) {
            (Some(_), HttpMethod::Get) => {
                Some(cache_key(desc.method, &request.url, args.named()))
            }
            _ => None,
        };
        let cached = match (&self.cache, &key) {
            (Some(cache), Some(key)) => cache.get(key),
            _ => None,
        };

        let (raw, hit) = match cached {
            Some(raw) => {
                tracing::debug!(path = desc.path, "binder.cache_hit");
                (raw, true)
            }
            None => (self.executor.execute(&request).await?, false),
        };

        let parsed = self
            .parser
            .parse(&raw.body, desc.payload_kind, desc.payload_list)?;

        // stored only after a successful parse
        if let (false, Some(cache), Some(key)) = (hit, &self.cache, key) {
            cache.store(key, raw);
        }
        Ok(parsed)
    }

    /// Probe mode keeping the value: `Some(output)` on success, `None` on any
    /// failure. Only descriptors flagged as probes may be called this way.
    pub async fn probe_value(
        &self,
        desc: &EndpointDescriptor,
        args: CallArgs,
    ) -> Result<Option<P::Output>> {
        if !desc.probe {
            return Err(Error::NotProbe(desc.path));
        }
        match self.call(desc, args).await {
            Ok(out) => Ok(Some(out)),
            Err(err) => {
                tracing::debug!(path = desc.path, error = %err, "binder.probe_false");
                Ok(None)
            }
        }
    }

    /// Existence-check mode: success is `true`, any failure is `false`.
    pub async fn probe(&self, desc: &EndpointDescriptor, args: CallArgs) -> Result<bool> {
        Ok(self.probe_value(desc, args).await?.is_some())
    }

    /// Lazy multi-page iteration over a paginated binding.
    pub fn cursor(&self, desc: &EndpointDescriptor, args: CallArgs) -> Result<Cursor<'_, P>>
    where
        P::Output: Paginated,
    {
        let Some(key) = desc.pagination_param() else {
            return Err(Error::NotPaginated(desc.path));
        };
        // a caller-supplied page/cursor is the starting point
        let start = args
            .get(key)
            .map(|raw| {
                raw.parse::<i64>().map_err(|_| Error::Parameter {
                    param: key.to_string(),
                    path: desc.path,
                })
            })
            .transpose()?;
        let cursor = Cursor::new(self, *desc, args);
        Ok(match start {
            Some(start) => cursor.starting_at(start),
            None => cursor,
        })
    }
}

/// A descriptor bound to a client, callable repeatedly.
#[derive(Debug)]
pub struct Binding<'a, P = JsonParser> {
    api: &'a Api<P>,
    desc: EndpointDescriptor,
}

impl<P> Clone for Binding<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for Binding<'_, P> {}

impl<'a, P: Parser> Binding<'a, P> {
    pub fn descriptor(&self) -> &EndpointDescriptor {
        &self.desc
    }

    pub async fn call(&self, args: CallArgs) -> Result<P::Output> {
        self.api.call(&self.desc, args).await
    }

    pub async fn probe(&self, args: CallArgs) -> Result<bool> {
        self.api.probe(&self.desc, args).await
    }

    pub async fn probe_value(&self, args: CallArgs) -> Result<Option<P::Output>> {
        self.api.probe_value(&self.desc, args).await
    }

    pub fn cursor(&self, args: CallArgs) -> Result<Cursor<'a, P>>
    where
        P::Output: Paginated,
    {
        self.api.cursor(&self.desc, args)
    }
}
