use std::sync::Arc;
use std::thread;

use spill_core::SpillError;
use spill_core::answers::{self, SubmitAnswer};
use spill_core::ports::{AccessLedgerRepository, SecretRepository};
use spill_core::rating::{self, aggregate};
use spill_core::unlock::{self, UnlockCommand};
use spill_db::Database;
use spill_types::models::{ANONYMOUS_NAME, AnswerData, ProjectedSecret};
use uuid::Uuid;

struct Fixture {
    db: Database,
    room: Uuid,
    question: Uuid,
    alice: Uuid,
    bob: Uuid,
    carol: Uuid,
}

fn fixture() -> Fixture {
    let db = Database::open_in_memory().unwrap();
    let (alice, bob, carol) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    db.create_user(alice, "Alice", Some("alice@example.com"), Some("https://img.example/a.png"))
        .unwrap();
    db.create_user(bob, "Bob", None, None).unwrap();
    db.create_user(carol, "Carol", None, None).unwrap();

    let room = Uuid::new_v4();
    db.create_room(room, "Friday night", alice).unwrap();
    db.add_member(room, bob).unwrap();
    db.add_member(room, carol).unwrap();

    let question = Uuid::new_v4();
    db.create_question(question, room, "What is your most irrational fear?")
        .unwrap();

    Fixture { db, room, question, alice, bob, carol }
}

impl Fixture {
    fn submit(&self, author: Uuid, body: &str, self_rating: i64, is_anonymous: bool) -> ProjectedSecret {
        answers::submit_answer(
            &self.db,
            SubmitAnswer {
                author_id: author,
                room_id: self.room,
                question_id: self.question,
                body: body.into(),
                self_rating,
                importance: 3,
                is_anonymous,
                answer_data: None,
            },
        )
        .unwrap()
        .secret
    }

    fn unlock(&self, secret: Uuid, buyer: Uuid, self_rating: i64) -> Result<ProjectedSecret, SpillError> {
        unlock::unlock(
            &self.db,
            UnlockCommand {
                secret_id: secret,
                buyer_id: buyer,
                question_id: self.question,
                body: "geese, honestly".into(),
                self_rating,
                importance: 2,
            },
        )
    }

    fn buyers_count(&self, secret: Uuid) -> u32 {
        self.db.find_secret(secret).unwrap().unwrap().secret.buyers_count
    }
}

#[test]
fn unlock_and_rating_walkthrough() {
    let f = fixture();
    let secret = f.submit(f.alice, "I am afraid of escalators", 3, false);
    assert_eq!(secret.avg_rating, Some(3.0));

    let err = f.unlock(secret.id, f.bob, 2).unwrap_err();
    assert!(matches!(err, SpillError::InsufficientRating { required: 3 }));
    assert!(err.to_string().contains('3'));
    assert_eq!(f.buyers_count(secret.id), 0);

    let unlocked = f.unlock(secret.id, f.bob, 4).unwrap();
    assert_eq!(unlocked.buyers_count, 1);
    assert_eq!(unlocked.body.as_deref(), Some("I am afraid of escalators"));
    assert!(unlocked.is_unlocked);

    let seen = answers::get_secret(&f.db, secret.id, f.bob).unwrap();
    assert_eq!(seen.body.as_deref(), Some("I am afraid of escalators"));

    assert_eq!(rating::rate(&f.db, secret.id, f.bob, 5).unwrap(), 4.0);

    f.unlock(secret.id, f.carol, 3).unwrap();
    assert_eq!(rating::rate(&f.db, secret.id, f.carol, 3).unwrap(), 3.7);

    // Re-rating replaces the earlier row
    assert_eq!(rating::rate(&f.db, secret.id, f.bob, 1).unwrap(), 2.3);
    let mut ratings = f.db.ratings_for(secret.id).unwrap();
    ratings.sort_unstable();
    assert_eq!(ratings, vec![1, 3]);

    let stored = f.db.find_secret(secret.id).unwrap().unwrap().secret;
    assert_eq!(stored.avg_rating, Some(2.3));
    assert_eq!(stored.buyers_count, 2);
    assert_eq!(f.db.count_unlocks(secret.id).unwrap(), 2);

    let bobs_view = answers::get_secret(&f.db, secret.id, f.bob).unwrap();
    assert_eq!(bobs_view.my_rating, Some(1));
}

#[test]
fn second_unlock_is_rejected_without_counting() {
    let f = fixture();
    let secret = f.submit(f.alice, "I cried at a car advert", 2, false);

    f.unlock(secret.id, f.bob, 2).unwrap();
    let err = f.unlock(secret.id, f.bob, 5).unwrap_err();
    assert!(matches!(err, SpillError::AlreadyUnlocked));
    assert_eq!(f.buyers_count(secret.id), 1);
}

#[test]
fn equal_spiciness_is_enough() {
    let f = fixture();
    let secret = f.submit(f.alice, "I never learned to whistle", 4, false);
    assert!(f.unlock(secret.id, f.bob, 4).is_ok());
}

#[test]
fn authors_cannot_unlock_or_rate_their_own_secret() {
    let f = fixture();
    let secret = f.submit(f.alice, "I read the last page first", 1, false);

    let err = f.unlock(secret.id, f.alice, 5).unwrap_err();
    assert!(matches!(err, SpillError::SelfUnlockForbidden));

    for rating in 1..=5 {
        let err = rating::rate(&f.db, secret.id, f.alice, rating).unwrap_err();
        assert!(matches!(err, SpillError::SelfRatingForbidden));
    }
}

#[test]
fn rating_requires_an_unlock() {
    let f = fixture();
    let secret = f.submit(f.alice, "I talk to my plants", 2, false);

    let err = rating::rate(&f.db, secret.id, f.bob, 4).unwrap_err();
    assert!(matches!(err, SpillError::NotUnlocked));

    let err = rating::rate(&f.db, secret.id, f.bob, 9).unwrap_err();
    assert!(matches!(err, SpillError::InvalidRating(_)));

    let err = rating::rate(&f.db, Uuid::new_v4(), f.bob, 4).unwrap_err();
    assert!(matches!(err, SpillError::NotFound(_)));
}

#[test]
fn unlock_checks_run_in_order() {
    let f = fixture();
    let missing = Uuid::new_v4();

    // Input problems win over a missing target
    let err = unlock::unlock(
        &f.db,
        UnlockCommand {
            secret_id: missing,
            buyer_id: f.bob,
            question_id: f.question,
            body: "   ".into(),
            self_rating: 3,
            importance: 3,
        },
    )
    .unwrap_err();
    assert!(matches!(err, SpillError::InvalidAnswer(_)));

    let err = f.unlock(missing, f.bob, 0).unwrap_err();
    assert!(matches!(err, SpillError::InvalidRating(_)));

    let err = f.unlock(missing, f.bob, 3).unwrap_err();
    assert!(matches!(err, SpillError::NotFound(_)));

    // Rating shortfall is reported before membership
    let outsider = Uuid::new_v4();
    f.db.create_user(outsider, "Outsider", None, None).unwrap();
    let secret = f.submit(f.alice, "I still have my baby teeth in a jar", 4, false);
    let err = f.unlock(secret.id, outsider, 1).unwrap_err();
    assert!(matches!(err, SpillError::InsufficientRating { required: 4 }));

    let err = f.unlock(secret.id, outsider, 5).unwrap_err();
    assert!(matches!(err, SpillError::NotAMember));
    assert_eq!(f.buyers_count(secret.id), 0);
}

#[test]
fn unlock_answer_must_be_for_the_same_question() {
    let f = fixture();
    let secret = f.submit(f.alice, "I fake laugh at my boss", 2, false);
    let err = unlock::unlock(
        &f.db,
        UnlockCommand {
            secret_id: secret.id,
            buyer_id: f.bob,
            question_id: Uuid::new_v4(),
            body: "pigeons".into(),
            self_rating: 5,
            importance: 1,
        },
    )
    .unwrap_err();
    assert!(matches!(err, SpillError::InvalidAnswer(_)));
}

#[test]
fn unlock_reuses_the_buyers_existing_answer() {
    let f = fixture();
    let target = f.submit(f.alice, "I eat cereal for dinner", 2, false);
    let own = f.submit(f.bob, "dolls", 1, true);

    f.unlock(target.id, f.bob, 3).unwrap();

    let answer = f
        .db
        .find_answer(f.room, f.bob, f.question)
        .unwrap()
        .unwrap();
    assert_eq!(answer.id, own.id);
    assert_eq!(answer.body, "geese, honestly");
    assert_eq!(answer.self_rating, 3);
    assert_eq!(answer.importance, 2);
    // Anonymity is the author's choice and survives the unlock
    assert!(answer.is_anonymous);

    let all = answers::question_answers(&f.db, f.room, f.question, f.alice).unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn unlock_turns_a_structured_answer_into_text() {
    let f = fixture();
    let target = f.submit(f.alice, "I still use a flip phone", 2, false);
    answers::submit_answer(
        &f.db,
        SubmitAnswer {
            author_id: f.bob,
            room_id: f.room,
            question_id: f.question,
            body: "heights, clowns".into(),
            self_rating: 1,
            importance: 1,
            is_anonymous: false,
            answer_data: Some(AnswerData::MultipleChoice {
                selected: vec!["heights".into(), "clowns".into()],
            }),
        },
    )
    .unwrap();

    f.unlock(target.id, f.bob, 2).unwrap();

    let answer = f
        .db
        .find_answer(f.room, f.bob, f.question)
        .unwrap()
        .unwrap();
    assert_eq!(answer.body, "geese, honestly");
    assert_eq!(answer.answer_data, AnswerData::Text);
    assert_eq!(answer.answer_type(), spill_types::models::AnswerType::Text);
}

#[test]
fn unlock_creates_the_buyers_answer_when_missing() {
    let f = fixture();
    let target = f.submit(f.alice, "I have never seen Star Wars", 2, false);

    f.unlock(target.id, f.carol, 2).unwrap();

    let answer = f
        .db
        .find_answer(f.room, f.carol, f.question)
        .unwrap()
        .unwrap();
    assert_eq!(answer.buyers_count, 0);
    assert_eq!(answer.avg_rating, Some(2.0));
    assert_eq!(answer.answer_data, AnswerData::Text);
}

#[test]
fn resubmission_edits_in_place() {
    let f = fixture();
    let first = answers::submit_answer(
        &f.db,
        SubmitAnswer {
            author_id: f.alice,
            room_id: f.room,
            question_id: f.question,
            body: "spiders".into(),
            self_rating: 2,
            importance: 2,
            is_anonymous: false,
            answer_data: None,
        },
    )
    .unwrap();
    assert!(first.created);

    f.unlock(first.secret.id, f.bob, 2).unwrap();
    rating::rate(&f.db, first.secret.id, f.bob, 5).unwrap();

    let second = answers::submit_answer(
        &f.db,
        SubmitAnswer {
            author_id: f.alice,
            room_id: f.room,
            question_id: f.question,
            body: "actually, moths".into(),
            self_rating: 5,
            importance: 4,
            is_anonymous: true,
            answer_data: None,
        },
    )
    .unwrap();
    assert!(!second.created);
    assert_eq!(second.secret.id, first.secret.id);
    assert_eq!(second.secret.body.as_deref(), Some("actually, moths"));
    assert_eq!(second.secret.importance, Some(4));
    // Aggregate follows the new self rating
    assert_eq!(second.secret.avg_rating, Some(aggregate(5, &[5])));
    assert_eq!(second.secret.buyers_count, 1);

    // Bob's unlock answer is the only other row in the room
    let listed = answers::room_secrets(&f.db, f.room, f.alice).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed.iter().filter(|s| s.is_own_secret).count(), 1);
}

#[test]
fn structured_answers_use_the_character_limit() {
    let f = fixture();
    let long_fallback = vec!["ab"; 150].join(" ");
    let submitted = answers::submit_answer(
        &f.db,
        SubmitAnswer {
            author_id: f.alice,
            room_id: f.room,
            question_id: f.question,
            body: long_fallback,
            self_rating: 1,
            importance: 1,
            is_anonymous: false,
            answer_data: Some(AnswerData::MultipleChoice {
                selected: vec!["heights".into(), "clowns".into()],
            }),
        },
    )
    .unwrap();
    assert_eq!(
        submitted.secret.answer_data,
        Some(AnswerData::MultipleChoice {
            selected: vec!["heights".into(), "clowns".into()]
        })
    );

    // Locked viewers see the type but not the payload
    let bobs_view = answers::get_secret(&f.db, submitted.secret.id, f.bob).unwrap();
    assert_eq!(bobs_view.answer_data, None);
    assert_eq!(
        bobs_view.answer_type,
        spill_types::models::AnswerType::MultipleChoice
    );
}

#[test]
fn submission_checks_membership_and_question() {
    let f = fixture();
    let outsider = Uuid::new_v4();
    f.db.create_user(outsider, "Outsider", None, None).unwrap();

    let cmd = |author: Uuid, question: Uuid| SubmitAnswer {
        author_id: author,
        room_id: f.room,
        question_id: question,
        body: "the dark".into(),
        self_rating: 2,
        importance: 2,
        is_anonymous: false,
        answer_data: None,
    };

    let err = answers::submit_answer(&f.db, cmd(outsider, f.question)).unwrap_err();
    assert!(matches!(err, SpillError::NotAMember));

    let err = answers::submit_answer(&f.db, cmd(f.alice, Uuid::new_v4())).unwrap_err();
    assert!(matches!(err, SpillError::NotFound("question")));
}

#[test]
fn anonymous_authors_are_masked_in_every_listing() {
    let f = fixture();
    let secret = f.submit(f.alice, "I once stole a traffic cone", 2, true);
    f.submit(f.bob, "ghosts", 2, false);
    f.submit(f.carol, "deep water", 5, false);
    f.unlock(secret.id, f.bob, 2).unwrap();

    for viewer in [f.bob, f.carol] {
        let room = answers::room_secrets(&f.db, f.room, viewer).unwrap();
        let question = answers::question_answers(&f.db, f.room, f.question, viewer).unwrap();
        for listing in [room, question] {
            let mine = listing.iter().find(|s| s.id == secret.id).unwrap();
            assert_eq!(mine.author_name, ANONYMOUS_NAME);
            assert_eq!(mine.author_avatar, None);
            assert_eq!(mine.author_id, None);
        }
    }

    let own = answers::room_secrets(&f.db, f.room, f.alice).unwrap();
    let mine = own.iter().find(|s| s.id == secret.id).unwrap();
    assert_eq!(mine.author_name, "Alice");
    assert!(mine.is_own_secret);
}

#[test]
fn collaborative_view_is_gated_on_answering() {
    let f = fixture();
    let first = f.submit(f.alice, "cotton wool", 1, false);
    let second = f.submit(f.carol, "mirrors at night", 1, false);

    let err = answers::question_answers(&f.db, f.room, f.question, f.bob).unwrap_err();
    assert!(matches!(err, SpillError::MustAnswerFirst));

    // Bob unlocks, then withdraws his own answer: unlocks alone do not open the view
    f.unlock(first.id, f.bob, 1).unwrap();
    let bobs = f.db.find_answer(f.room, f.bob, f.question).unwrap().unwrap();
    answers::hide_secret(&f.db, bobs.id, f.bob).unwrap();
    assert!(f.db.has_unlocked(f.bob, first.id).unwrap());

    let err = answers::question_answers(&f.db, f.room, f.question, f.bob).unwrap_err();
    assert!(matches!(err, SpillError::MustAnswerFirst));

    // Oldest first, hidden answers left out
    let view = answers::question_answers(&f.db, f.room, f.question, f.alice).unwrap();
    let ids: Vec<Uuid> = view.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
    assert!(view[0].is_own_secret);
    assert_eq!(view[1].body, None);
}

#[test]
fn room_listing_requires_membership_and_projects_per_viewer() {
    let f = fixture();
    let secret = f.submit(f.alice, "I sing in the car", 3, false);

    let outsider = Uuid::new_v4();
    f.db.create_user(outsider, "Outsider", None, None).unwrap();
    let err = answers::room_secrets(&f.db, f.room, outsider).unwrap_err();
    assert!(matches!(err, SpillError::NotAMember));

    let locked = answers::room_secrets(&f.db, f.room, f.bob).unwrap();
    assert_eq!(locked[0].body, None);
    assert_eq!(locked[0].self_rating, 3);

    f.unlock(secret.id, f.bob, 3).unwrap();
    let listing = answers::room_secrets(&f.db, f.room, f.bob).unwrap();
    let unlocked = listing.iter().find(|s| s.id == secret.id).unwrap();
    assert_eq!(unlocked.body.as_deref(), Some("I sing in the car"));
    // Newest first: Bob's unlock answer was written after Alice's secret
    assert!(listing[0].is_own_secret);
}

#[test]
fn hidden_secrets_leave_every_path() {
    let f = fixture();
    let secret = f.submit(f.alice, "I have a secret second cat", 2, false);
    f.unlock(secret.id, f.bob, 2).unwrap();

    let err = answers::hide_secret(&f.db, secret.id, f.bob).unwrap_err();
    assert!(matches!(err, SpillError::NotAuthor));

    answers::hide_secret(&f.db, secret.id, f.alice).unwrap();

    assert!(answers::room_secrets(&f.db, f.room, f.bob)
        .unwrap()
        .iter()
        .all(|s| s.id != secret.id));
    assert!(matches!(
        answers::get_secret(&f.db, secret.id, f.bob).unwrap_err(),
        SpillError::NotFound(_)
    ));
    assert!(matches!(
        rating::rate(&f.db, secret.id, f.bob, 4).unwrap_err(),
        SpillError::NotFound(_)
    ));
    assert!(matches!(
        f.unlock(secret.id, f.carol, 5).unwrap_err(),
        SpillError::NotFound(_)
    ));
    assert!(matches!(
        answers::hide_secret(&f.db, secret.id, f.alice).unwrap_err(),
        SpillError::NotFound(_)
    ));

    // Alice can answer again once her old answer is hidden
    let fresh = f.submit(f.alice, "fine, two cats", 2, false);
    assert_ne!(fresh.id, secret.id);
}

#[test]
fn concurrent_unlocks_keep_the_counter_exact() {
    let f = fixture();
    let secret = f.submit(f.alice, "I have never flossed", 1, false);
    let room = f.room;
    let question = f.question;
    let db = Arc::new(f.db);

    let buyers: Vec<Uuid> = (0..16)
        .map(|i| {
            let id = Uuid::new_v4();
            db.create_user(id, &format!("buyer-{i}"), None, None).unwrap();
            db.add_member(room, id).unwrap();
            id
        })
        .collect();

    // Every buyer tries twice at once; exactly one attempt each may succeed
    let handles: Vec<_> = buyers
        .iter()
        .flat_map(|&buyer| [buyer, buyer])
        .map(|buyer| {
            let db = Arc::clone(&db);
            let secret_id = secret.id;
            thread::spawn(move || {
                unlock::unlock(
                    db.as_ref(),
                    UnlockCommand {
                        secret_id,
                        buyer_id: buyer,
                        question_id: question,
                        body: "me neither".into(),
                        self_rating: 2,
                        importance: 1,
                    },
                )
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, buyers.len());
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, SpillError::AlreadyUnlocked)));

    let stored = db.find_secret(secret.id).unwrap().unwrap().secret;
    assert_eq!(stored.buyers_count, db.count_unlocks(secret.id).unwrap());
    assert_eq!(stored.buyers_count as usize, buyers.len());

    // Concurrent raters: the aggregate accounts for every one of them
    let handles: Vec<_> = buyers
        .iter()
        .enumerate()
        .map(|(i, &buyer)| {
            let db = Arc::clone(&db);
            let secret_id = secret.id;
            thread::spawn(move || rating::rate(db.as_ref(), secret_id, buyer, (i % 5) as i64 + 1))
        })
        .collect();
    for h in handles {
        h.join().unwrap().unwrap();
    }

    let ratings = db.ratings_for(secret.id).unwrap();
    assert_eq!(ratings.len(), buyers.len());
    let stored = db.find_secret(secret.id).unwrap().unwrap().secret;
    assert_eq!(stored.avg_rating, Some(aggregate(1, &ratings)));
}

#[test]
fn file_backed_database_serves_reads_from_the_pool() {
    let path = std::env::temp_dir().join(format!("spill-test-{}.db", Uuid::new_v4()));
    {
        let db = Database::open(&path).unwrap();
        let (author, room, question) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        db.create_user(author, "Dana", None, None).unwrap();
        db.create_room(room, "Pool room", author).unwrap();
        db.create_question(question, room, "Worst haircut?").unwrap();

        let submitted = answers::submit_answer(
            &db,
            SubmitAnswer {
                author_id: author,
                room_id: room,
                question_id: question,
                body: "a mullet, in 2019".into(),
                self_rating: 2,
                importance: 1,
                is_anonymous: false,
                answer_data: None,
            },
        )
        .unwrap();
        assert!(submitted.created);

        for _ in 0..8 {
            let listed = answers::room_secrets(&db, room, author).unwrap();
            assert_eq!(listed.len(), 1);
        }
    }

    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.clone().into_os_string();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}
