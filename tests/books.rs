mod common;

use axum::http::StatusCode;
use catalog_app::modules::authors::models::Author;
use catalog_app::modules::bookinstances::models::{BookInstance, Status};
use catalog_app::modules::books::models::Book;
use catalog_app::modules::genres::models::Genre;
use catalog_db::{DocId, Filter, Record};
use common::TestApp;

struct Fixture {
    app: TestApp,
    author: Record<Author>,
    fantasy: Record<Genre>,
    poetry: Record<Genre>,
}

async fn fixture() -> Fixture {
    let app = TestApp::new().await;
    let author = app
        .catalog
        .authors
        .save(Author {
            first_name: "Patrick".to_string(),
            family_name: "Rothfuss".to_string(),
            date_of_birth: None,
            date_of_death: None,
        })
        .await
        .unwrap();
    let fantasy = app
        .catalog
        .genres
        .save(Genre {
            name: "Fantasy".to_string(),
        })
        .await
        .unwrap();
    let poetry = app
        .catalog
        .genres
        .save(Genre {
            name: "Poetry".to_string(),
        })
        .await
        .unwrap();
    Fixture {
        app,
        author,
        fantasy,
        poetry,
    }
}

impl Fixture {
    async fn add_book(&self, title: &str, genre: Vec<DocId>) -> Record<Book> {
        self.app
            .catalog
            .books
            .save(Book {
                title: title.to_string(),
                author: self.author.id.clone(),
                summary: "A summary.".to_string(),
                isbn: "9781473211896".to_string(),
                genre,
            })
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn create_keeps_every_selected_genre() {
    let f = fixture().await;
    let response = f
        .app
        .post(
            "/catalog/book/create",
            &[
                ("title", "The Name of the Wind"),
                ("author", f.author.id.as_str()),
                ("summary", "Kvothe's story."),
                ("isbn", "9781473211896"),
                ("genre", f.fantasy.id.as_str()),
                ("genre", f.poetry.id.as_str()),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let id = DocId::from(response.redirected_id());
    let book = f.app.catalog.books.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(book.data.genre, vec![f.fantasy.id.clone(), f.poetry.id.clone()]);

    let detail = f.app.get(&format!("/catalog/book/{id}")).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert!(detail.body.contains("Rothfuss, Patrick"));
    assert!(detail.body.contains("Fantasy"));
    assert!(detail.body.contains("Poetry"));
}

#[tokio::test]
async fn create_without_genres_stores_an_empty_list() {
    let f = fixture().await;
    let response = f
        .app
        .post(
            "/catalog/book/create",
            &[
                ("title", "Untagged"),
                ("author", f.author.id.as_str()),
                ("summary", "Nothing."),
                ("isbn", "1"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let id = DocId::from(response.redirected_id());
    let book = f.app.catalog.books.find_by_id(&id).await.unwrap().unwrap();
    assert!(book.data.genre.is_empty());
}

#[tokio::test]
async fn invalid_create_keeps_selected_genres_checked() {
    let f = fixture().await;
    let response = f
        .app
        .post(
            "/catalog/book/create",
            &[
                ("title", ""),
                ("author", f.author.id.as_str()),
                ("summary", "Kvothe's story."),
                ("isbn", ""),
                ("genre", f.poetry.id.as_str()),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Title must not be empty."));
    assert!(response.body.contains("ISBN must not be empty."));
    assert!(response
        .body
        .contains(&format!("value=\"{}\" checked", f.poetry.id)));
    assert!(!response
        .body
        .contains(&format!("value=\"{}\" checked", f.fantasy.id)));
    assert!(response
        .body
        .contains(&format!("value=\"{}\" selected", f.author.id)));
    assert_eq!(f.app.catalog.books.count(Filter::All).await.unwrap(), 0);
}

#[tokio::test]
async fn list_is_sorted_and_shows_authors() {
    let f = fixture().await;
    f.add_book("The Wise Man's Fear", vec![]).await;
    f.add_book("The Name of the Wind", vec![]).await;

    let response = f.app.get("/catalog/books").await;
    assert_eq!(response.status, StatusCode::OK);
    let name = response.body.find("The Name of the Wind").unwrap();
    let fear = response.body.find("The Wise Man's Fear").unwrap();
    assert!(name < fear);
    assert!(response.body.contains("(Rothfuss, Patrick)"));
}

#[tokio::test]
async fn dangling_references_render_as_missing() {
    let f = fixture().await;
    let book = f.add_book("Orphan", vec![f.fantasy.id.clone()]).await;
    f.app.catalog.authors.delete_by_id(&f.author.id).await.unwrap();
    f.app.catalog.genres.delete_by_id(&f.fantasy.id).await.unwrap();

    let detail = f.app.get(&format!("/catalog/book/{}", book.id)).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert!(detail.body.contains("Unknown"));
    assert!(!detail.body.contains("Fantasy"));
}

#[tokio::test]
async fn detail_lists_copies() {
    let f = fixture().await;
    let book = f.add_book("The Name of the Wind", vec![]).await;
    f.app
        .catalog
        .instances
        .save(BookInstance {
            book: book.id.clone(),
            imprint: "Gollancz, 2014.".to_string(),
            status: Status::Available,
            due_back: None,
        })
        .await
        .unwrap();

    let response = f.app.get(&format!("/catalog/book/{}", book.id)).await;
    assert!(response.body.contains("Gollancz, 2014."));
    assert!(response.body.contains("<title>The Name of the Wind</title>"));
}

#[tokio::test]
async fn missing_book_is_not_found() {
    let f = fixture().await;
    let response = f.app.get("/catalog/book/missing").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body.contains("Book not found"));
}

#[tokio::test]
async fn delete_is_blocked_while_copies_exist() {
    let f = fixture().await;
    let book = f.add_book("Held", vec![]).await;
    let copy = f
        .app
        .catalog
        .instances
        .save(BookInstance {
            book: book.id.clone(),
            imprint: "Tor".to_string(),
            status: Status::Loaned,
            due_back: None,
        })
        .await
        .unwrap();

    let uri = format!("/catalog/book/{}/delete", book.id);
    let response = f.app.post(&uri, &[("bookid", book.id.as_str())]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Delete the following copies"));
    assert!(f.app.catalog.books.find_by_id(&book.id).await.unwrap().is_some());

    f.app.catalog.instances.delete_by_id(&copy.id).await.unwrap();
    let response = f.app.post(&uri, &[("bookid", book.id.as_str())]).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/catalog/books"));
    assert!(f.app.catalog.books.find_by_id(&book.id).await.unwrap().is_none());
}

#[tokio::test]
async fn update_replaces_fields_and_keeps_the_identifier() {
    let f = fixture().await;
    let book = f.add_book("Draft", vec![f.fantasy.id.clone()]).await;

    let uri = format!("/catalog/book/{}/update", book.id);
    let form = f.app.get(&uri).await;
    assert_eq!(form.status, StatusCode::OK);
    assert!(form.body.contains(&format!("value=\"{}\" checked", f.fantasy.id)));

    let response = f
        .app
        .post(
            &uri,
            &[
                ("title", "Final"),
                ("author", f.author.id.as_str()),
                ("summary", "Done."),
                ("isbn", "42"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.redirected_id(), book.id.as_str());

    let updated = f.app.catalog.books.find_by_id(&book.id).await.unwrap().unwrap();
    assert_eq!(updated.data.title, "Final");
    assert!(updated.data.genre.is_empty());
    assert_eq!(f.app.catalog.books.count(Filter::All).await.unwrap(), 1);
}

#[tokio::test]
async fn update_form_offers_every_candidate() {
    let f = fixture().await;
    let book = f.add_book("Draft", vec![f.poetry.id.clone()]).await;

    let form = f.app.get(&format!("/catalog/book/{}/update", book.id)).await;
    assert_eq!(form.status, StatusCode::OK);
    assert!(form.body.contains(&format!("value=\"{}\" selected", f.author.id)));
    assert!(form.body.contains(&format!("value=\"{}\" checked", f.poetry.id)));
    assert!(form.body.contains(&format!("value=\"{}\">", f.fantasy.id)));

    let missing = f.app.get("/catalog/book/missing/update").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert!(missing.body.contains("Book not found"));
}
