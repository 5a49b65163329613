mod common;

use common::{ScriptedTransport, api_with, ok};
use perch_api::{BearerAuth, Error};
use perch_config::ClientConfig;
use std::fs;
use tempfile::tempdir;

fn authed(t: std::sync::Arc<ScriptedTransport>) -> perch_api::Api {
    api_with(ClientConfig::default(), t)
        .with_auth(BearerAuth::new("test-token", None).unwrap())
}

#[tokio::test]
async fn profile_image_is_uploaded_as_one_part() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("me.png");
    fs::write(&path, b"\x89PNG\r\n\x1a\nfake")?;

    let t = ScriptedTransport::new(vec![ok(r#"{"screen_name":"alice"}"#)]);
    let api = authed(t.clone());
    api.update_profile_image(&path).await?;

    let req = &t.requests()[0];
    assert_eq!(req.url.path(), "/1/account/update_profile_image.json");
    assert_eq!(
        req.header("content-type"),
        Some("multipart/form-data; boundary=Tw3ePy")
    );
    let body = req.body.clone().unwrap_or_default();
    assert_eq!(req.header("content-length"), Some(body.len().to_string().as_str()));
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("name=\"image\"; filename=\"me.png\""));
    assert!(text.contains("Content-Type: image/png"));
    assert_eq!(req.header("authorization"), Some("Bearer test-token"));
    Ok(())
}

#[tokio::test]
async fn oversized_avatar_never_reaches_the_network() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("huge.jpg");
    fs::write(&path, vec![0u8; 701 * 1024])?;

    let t = ScriptedTransport::new(vec![ok("{}")]);
    let api = authed(t.clone());
    let err = api.update_profile_image(&path).await.unwrap_err();
    assert!(matches!(err, Error::FileTooLarge { max_kb: 700, .. }));
    assert_eq!(t.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn background_allows_larger_files_and_sends_tile_in_query() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("bg.gif");
    fs::write(&path, vec![0u8; 750 * 1024])?;

    let t = ScriptedTransport::new(vec![ok("{}")]);
    let api = authed(t.clone());
    api.update_profile_background_image(&path, Some(true)).await?;

    let req = &t.requests()[0];
    assert_eq!(req.url.query(), Some("tile=true"));
    let text = String::from_utf8_lossy(req.body.as_deref().unwrap_or_default()).into_owned();
    assert!(text.contains("Content-Type: image/gif"));
    Ok(())
}

#[tokio::test]
async fn text_files_are_refused() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("notes.txt");
    fs::write(&path, "not an image")?;

    let t = ScriptedTransport::new(vec![ok("{}")]);
    let api = authed(t.clone());
    let err = api.update_profile_image(&path).await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedType(_)));
    assert_eq!(t.calls(), 0);
    Ok(())
}
