mod common;

use photo_enhance::enhance::{
    EnhancedImage, EnhancementOptions, EnhancementTransport, RequestError, SessionCommand,
    SessionController, SessionImage, SliderSignal,
};

use async_trait::async_trait;
use common::jpeg_source;

struct EchoTransport;

#[async_trait]
impl EnhancementTransport for EchoTransport {
    async fn submit(
        &self,
        image: &SessionImage,
        _options: &EnhancementOptions,
    ) -> Result<EnhancedImage, RequestError> {
        Ok(EnhancedImage::new(image.bytes().clone()))
    }
}

async fn resulted_session() -> SessionController<EchoTransport> {
    let mut session = SessionController::new(EchoTransport, Default::default());
    session
        .dispatch(SessionCommand::FileChosen(jpeg_source("face.jpg", 48, 48)))
        .await;
    let reply = session.dispatch(SessionCommand::Enhance).await;
    assert!(reply.error.is_none());
    session
}

#[tokio::test]
async fn keyboard_keys_drive_the_slider_within_bounds() {
    let mut session = resulted_session().await;

    let mut positions = Vec::new();
    for key in ["ArrowLeft", "ArrowLeft", "ArrowUp", "Home", "ArrowDown", "End", "ArrowRight"] {
        let signal = SliderSignal::from_key(key).expect("navigation key");
        let reply = session.dispatch(SessionCommand::Navigate(signal)).await;
        positions.push(reply.snapshot.slider_position);
    }

    assert_eq!(positions, vec![45.0, 40.0, 45.0, 0.0, 0.0, 100.0, 100.0]);
}

#[tokio::test]
async fn new_image_resets_slider_to_center() {
    let mut session = resulted_session().await;
    session
        .dispatch(SessionCommand::Navigate(SliderSignal::End))
        .await;

    let reply = session
        .dispatch(SessionCommand::FileChosen(jpeg_source("other.jpg", 16, 16)))
        .await;

    assert_eq!(reply.snapshot.slider_position, 50.0);
    assert!(reply.snapshot.comparison.is_none());
    assert_eq!(reply.snapshot.live_handles, 0);
}

#[tokio::test]
async fn repeated_sessions_do_not_accumulate_handles() {
    let mut session = resulted_session().await;

    for round in 0..5 {
        session
            .dispatch(SessionCommand::FileChosen(jpeg_source("face.jpg", 24 + round, 24)))
            .await;
        let reply = session.dispatch(SessionCommand::Enhance).await;
        assert_eq!(reply.snapshot.live_handles, 2);
    }

    let reply = session.dispatch(SessionCommand::Reset).await;
    assert_eq!(reply.snapshot.live_handles, 0);
}
