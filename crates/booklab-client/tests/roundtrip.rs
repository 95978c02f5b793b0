use booklab_client::{
    BookDraft, BookPatch, CatalogApi, CatalogView, ClientError, Route, RouteGuard, SessionStore,
};
use booklab_server::{BookLabConfig, BookLabServer};

async fn spawn_server(dir: &std::path::Path) -> String {
    let config = BookLabConfig {
        data_dir: dir.to_path_buf(),
        ..BookLabConfig::default()
    };
    let server = BookLabServer::new(config).expect("server");
    let router = server.router().expect("router");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

fn draft(title: &str) -> BookDraft {
    BookDraft {
        title: title.to_string(),
        author: "Herbert".to_string(),
        publisher: "Chilton".to_string(),
        published_date: "1965".to_string(),
        pages: "412".to_string(),
        description: "Desert planet epic".to_string(),
    }
}

#[tokio::test]
async fn catalog_crud_roundtrip_keeps_view_in_sync() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base_url = spawn_server(dir.path()).await;
    let api = CatalogApi::new(&base_url).expect("api");
    let mut view = CatalogView::new();

    view.load(api.list_books().await.expect("initial list"));
    assert!(view.books().is_empty());

    let first = api.create_book(&draft("Dune"), None).await.expect("create");
    assert!(first.image.is_none());
    view.apply_created(first.clone());

    let second = api
        .create_book(&draft("Dune Messiah"), None)
        .await
        .expect("create");
    view.apply_created(second.clone());
    assert_eq!(view.books()[0].id, second.id);
    assert_eq!(view.books()[1].id, first.id);

    // the server agrees with the locally reconciled ordering
    let listed = api.list_books().await.expect("list");
    let listed_ids: Vec<&str> = listed.iter().map(|book| book.id.as_str()).collect();
    let view_ids: Vec<&str> = view.books().iter().map(|book| book.id.as_str()).collect();
    assert_eq!(listed_ids, view_ids);

    let patch = BookPatch {
        title: Some("Dune (revised)".to_string()),
        ..BookPatch::default()
    };
    let updated = api
        .update_book(&first.id, &patch, None)
        .await
        .expect("update");
    assert_eq!(updated.author, first.author);
    assert!(view.apply_updated(updated.clone()));
    assert_eq!(view.books()[1].title, "Dune (revised)");

    let message = api.delete_book(&second.id).await.expect("delete");
    assert_eq!(message, "Book deleted successfully");
    assert!(view.apply_deleted(&second.id));
    assert_eq!(view.books().len(), 1);

    let remaining = api.list_books().await.expect("list");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, first.id);
}

#[tokio::test]
async fn attached_cover_is_fetchable_through_the_client() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base_url = spawn_server(dir.path()).await;
    let api = CatalogApi::new(&base_url).expect("api");

    let picked = dir.path().join("cover.png");
    std::fs::write(&picked, b"png-bytes").expect("write cover");
    let cover = booklab_client::Attachment::read_from(&picked)
        .await
        .expect("read cover");
    assert_eq!(cover.filename, "cover.png");
    let record = api
        .create_book(&draft("Dune"), Some(cover))
        .await
        .expect("create");
    let reference = record.image.expect("image reference");
    assert!(reference.starts_with("/uploads/"));

    let bytes = api.fetch_asset(&reference).await.expect("fetch asset");
    assert_eq!(bytes, b"png-bytes");
}

#[tokio::test]
async fn server_side_errors_are_surfaced_verbatim() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base_url = spawn_server(dir.path()).await;
    let api = CatalogApi::new(&base_url).expect("api");

    // client-side validation catches the empty field first
    let mut incomplete = draft("Dune");
    incomplete.title.clear();
    assert_eq!(
        incomplete.validate().unwrap_err(),
        "All fields are required."
    );

    // submitting anyway gets the server's own wording back
    let err = api
        .create_book(&incomplete, None)
        .await
        .expect_err("server rejects");
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("title"), "server message: {message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = api
        .delete_book("never-created")
        .await
        .expect_err("not found");
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "book not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn login_stores_a_token_that_opens_the_catalog_route() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base_url = spawn_server(dir.path()).await;
    let api = CatalogApi::new(&base_url).expect("api");

    let session = SessionStore::new(dir.path().join("client/token"));
    let guard = RouteGuard::new(session.clone());
    assert_eq!(guard.resolve(Route::Catalog), Route::Login);

    api.register("reader@booklab.dev", "turning-pages")
        .await
        .expect("register");
    let grant = api
        .login("reader@booklab.dev", "turning-pages")
        .await
        .expect("login");
    session.save_token(&grant.token).expect("save token");

    assert_eq!(guard.resolve(Route::Catalog), Route::Catalog);

    session.clear().expect("logout");
    assert_eq!(guard.resolve(Route::Catalog), Route::Login);
}
