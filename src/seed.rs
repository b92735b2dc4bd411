//! Sample catalog for local development.

use anyhow::bail;
use catalog_db::DocId;
use chrono::NaiveDate;

use crate::modules::authors::models::Author;
use crate::modules::bookinstances::models::{BookInstance, Status};
use crate::modules::books::models::Book;
use crate::modules::genres::models::Genre;
use crate::modules::home::Counts;
use crate::state::Catalog;

const AUTHORS: &[(&str, &str, Option<(i32, u32, u32)>, Option<(i32, u32, u32)>)] = &[
    ("Patrick", "Rothfuss", Some((1973, 6, 6)), None),
    ("Ben", "Bova", Some((1932, 11, 8)), None),
    ("Isaac", "Asimov", Some((1920, 1, 2)), Some((1992, 4, 6))),
    ("Bob", "Billings", None, None),
    ("Jim", "Jones", Some((1971, 12, 16)), None),
];

const GENRES: &[&str] = &["Fantasy", "Science Fiction", "French Poetry"];

/// (title, author index, summary, isbn, genre indexes)
const BOOKS: &[(&str, usize, &str, &str, &[usize])] = &[
    (
        "The Name of the Wind (The Kingkiller Chronicle, #1)",
        0,
        "I have stolen princesses back from sleeping barrow kings. I burned down the town of Trebon.",
        "9781473211896",
        &[0],
    ),
    (
        "The Wise Man's Fear (The Kingkiller Chronicle, #2)",
        0,
        "Picking up the tale of Kvothe Kingkiller once again, we follow him into exile.",
        "9788401352836",
        &[0],
    ),
    (
        "The Slow Regard of Silent Things (Kingkiller Chronicle)",
        0,
        "Deep below the University, there is a dark place.",
        "9780756411336",
        &[0],
    ),
    (
        "Apes and Angels",
        1,
        "Humankind headed out to the stars not for conquest, nor exploration, nor even for curiosity.",
        "9780765379528",
        &[1],
    ),
    (
        "Death Wave",
        1,
        "In Ben Bova's previous novel New Earth, Jordan Kell led the first human mission beyond the solar system.",
        "9780765379504",
        &[1],
    ),
    ("Test Book 1", 4, "Summary of test book 1", "ISBN111111", &[0, 1]),
    ("Test Book 2", 4, "Summary of test book 2", "ISBN222222", &[]),
];

/// (book index, imprint, status, due back)
const COPIES: &[(usize, &str, Status, Option<(i32, u32, u32)>)] = &[
    (0, "London Gollancz, 2014.", Status::Available, None),
    (1, "Gollancz, 2011.", Status::Loaned, Some((2026, 11, 1))),
    (2, "Gollancz, 2015.", Status::Available, None),
    (3, "New York Tom Doherty Associates, 2016.", Status::Available, None),
    (3, "New York Tom Doherty Associates, 2016.", Status::Available, None),
    (3, "New York Tom Doherty Associates, 2016.", Status::Available, None),
    (4, "New York, NY Tor, 2015.", Status::Available, None),
    (4, "New York, NY Tor, 2015.", Status::Maintenance, None),
    (4, "New York, NY Tor, 2015.", Status::Loaned, None),
    (0, "Imprint XXX2", Status::Available, None),
    (1, "Imprint XXX3", Status::Available, None),
];

fn date(parts: Option<(i32, u32, u32)>) -> Option<NaiveDate> {
    parts.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
}

/// Populate an empty catalog. Refuses to touch a catalog that already has data.
pub async fn seed(catalog: &Catalog) -> anyhow::Result<Counts> {
    let existing = Counts::fetch(catalog).await?;
    let total = existing.author_count
        + existing.book_count
        + existing.genre_count
        + existing.book_instance_count;
    if total > 0 {
        bail!("catalog is not empty; refusing to seed");
    }

    let mut authors: Vec<DocId> = Vec::with_capacity(AUTHORS.len());
    for &(first_name, family_name, born, died) in AUTHORS {
        let author = Author {
            first_name: first_name.to_string(),
            family_name: family_name.to_string(),
            date_of_birth: date(born),
            date_of_death: date(died),
        };
        authors.push(catalog.authors.save(author).await?.id);
    }

    let mut genres: Vec<DocId> = Vec::with_capacity(GENRES.len());
    for &name in GENRES {
        let genre = Genre {
            name: name.to_string(),
        };
        genres.push(catalog.genres.save(genre).await?.id);
    }

    let mut books: Vec<DocId> = Vec::with_capacity(BOOKS.len());
    for &(title, author, summary, isbn, genre) in BOOKS {
        let book = Book {
            title: title.to_string(),
            author: authors[author].clone(),
            summary: summary.to_string(),
            isbn: isbn.to_string(),
            genre: genre.iter().map(|&index| genres[index].clone()).collect(),
        };
        books.push(catalog.books.save(book).await?.id);
    }

    for &(book, imprint, status, due_back) in COPIES {
        let copy = BookInstance {
            book: books[book].clone(),
            imprint: imprint.to_string(),
            status,
            due_back: date(due_back),
        };
        catalog.instances.save(copy).await?;
    }

    let counts = Counts::fetch(catalog).await?;
    tracing::info!(
        authors = counts.author_count,
        books = counts.book_count,
        genres = counts.genre_count,
        copies = counts.book_instance_count,
        "catalog seeded"
    );
    Ok(counts)
}
