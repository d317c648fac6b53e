//! Request and response shapes. Write shapes validate themselves into the
//! plain values the store layer consumes; read shapes are built from entity
//! rows.

use jiff::{Timestamp, civil::Date};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{
    entities::{actor, casting, comment, movie, rating, user},
    error::{AppError, AppResult, FieldErrors},
};

pub const COMMENT_MAX_CHARS: usize = 2000;
pub const SCORE_MIN: i64 = 0;
pub const SCORE_MAX: i64 = 10;
const USERNAME_MAX_CHARS: usize = 150;

/// Distinguishes an absent key (`None`) from an explicit `null` (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub fn timestamp(seconds: i64) -> Timestamp {
    Timestamp::from_second(seconds).unwrap_or_default()
}

/// "1h 45m", or "45m" when under an hour. Empty when the runtime is unknown.
pub fn format_duration(minutes: Option<i32>) -> String {
    let Some(minutes) = minutes else {
        return String::new();
    };
    let (hours, minutes) = (minutes / 60, minutes % 60);
    if hours > 0 { format!("{hours}h {minutes}m") } else { format!("{minutes}m") }
}

#[derive(Default)]
struct Errors(FieldErrors);

impl Errors {
    fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    fn max_chars(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(field, format!("Ensure this field has no more than {max} characters."));
        }
    }

    fn date(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        let value = value?;
        match value.parse::<Date>() {
            Ok(date) => Some(date.to_string()),
            Err(_) => {
                self.add(field, "Date has wrong format. Use YYYY-MM-DD.");
                None
            }
        }
    }

    fn finish(self) -> AppResult<()> {
        if self.0.is_empty() { Ok(()) } else { Err(AppError::Validation(self.0)) }
    }
}

/// Deserializes a JSON object into a write shape, reporting every key whose
/// value has the wrong type (or is out of range) as an error on that field.
/// `T` must accept any subset of its keys.
pub fn from_fields<T: DeserializeOwned>(body: Map<String, Value>) -> AppResult<T> {
    let mut errors = Errors::default();
    for (key, value) in &body {
        let single = Map::from_iter([(key.clone(), value.clone())]);
        if let Err(e) = serde_json::from_value::<T>(Value::Object(single)) {
            errors.add(key, e.to_string());
        }
    }
    errors.finish()?;
    serde_json::from_value(Value::Object(body)).map_err(|e| AppError::BadRequest(e.to_string()))
}

// -----------------------------------------------------------------------------
// Pagination
// -----------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
    pub results: Vec<T>,
}

// -----------------------------------------------------------------------------
// Users
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct UserCreate {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl UserCreate {
    pub fn validate(&self, password_min_length: usize) -> AppResult<()> {
        let mut errors = Errors::default();
        if self.username.is_empty() {
            errors.add("username", "This field may not be blank.");
        } else if !self
            .username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
        errors.max_chars("username", &self.username, USERNAME_MAX_CHARS);
        if self.password.chars().count() < password_min_length {
            errors.add(
                "password",
                format!("Ensure this field has at least {password_min_length} characters."),
            );
        }
        errors.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access: String,
    pub token_type: &'static str,
    /// Seconds until the access token expires.
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct UserRead {
    pub id: i32,
    pub username: String,
}

impl From<user::Model> for UserRead {
    fn from(u: user::Model) -> Self {
        Self { id: u.id, username: u.username }
    }
}

// -----------------------------------------------------------------------------
// Actors and casting
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ActorCreate {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub full_name: String,
    pub birth_date: Option<String>,
    #[serde(default)]
    pub biography: String,
    pub photo: Option<String>,
}

/// Validated actor fields. A blank `full_name` is derived when the row is
/// saved.
#[derive(Debug, Clone)]
pub struct NewActor {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub birth_date: Option<String>,
    pub biography: String,
    pub photo: Option<String>,
}

impl ActorCreate {
    pub fn validate(self) -> AppResult<NewActor> {
        let mut errors = Errors::default();
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();
        if last_name.is_empty() {
            errors.add("last_name", "This field may not be blank.");
        }
        errors.max_chars("first_name", &first_name, 100);
        errors.max_chars("last_name", &last_name, 100);
        let full_name = self.full_name.trim().to_string();
        if full_name.is_empty() {
            let derived = actor::derive_full_name(&first_name, &last_name);
            errors.max_chars("full_name", &derived, 200);
        } else {
            errors.max_chars("full_name", &full_name, 200);
        }
        let birth_date = errors.date("birth_date", self.birth_date.as_deref());
        errors.finish()?;

        Ok(NewActor {
            first_name,
            last_name,
            full_name,
            birth_date,
            biography: self.biography,
            photo: self.photo.filter(|p| !p.is_empty()),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActorRead {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub birth_date: Option<String>,
    pub biography: String,
    pub photo: Option<String>,
}

impl From<actor::Model> for ActorRead {
    fn from(a: actor::Model) -> Self {
        Self {
            id: a.id,
            first_name: a.first_name,
            last_name: a.last_name,
            full_name: a.full_name,
            birth_date: a.birth_date,
            biography: a.biography,
            photo: a.photo,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CastingWrite {
    pub actor_id: Option<i32>,
    #[serde(default)]
    pub role_name: String,
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCasting {
    pub actor_id: i32,
    pub role_name: String,
    pub order: i32,
}

impl CastingWrite {
    fn check(&self) -> Result<NewCasting, Vec<(&'static str, String)>> {
        let mut problems = Vec::new();
        let role_name = self.role_name.trim().to_string();
        if role_name.chars().count() > 200 {
            problems.push(("role_name", "Ensure this field has no more than 200 characters.".into()));
        }
        if self.order < 0 {
            problems.push(("order", "Ensure this value is greater than or equal to 0.".into()));
        }
        match self.actor_id {
            Some(actor_id) if problems.is_empty() => {
                Ok(NewCasting { actor_id, role_name, order: self.order })
            }
            Some(_) => Err(problems),
            None => {
                problems.push(("actor_id", "This field is required.".into()));
                Err(problems)
            }
        }
    }

    /// Validates a single entry posted to a movie's casting list.
    pub fn validate(self) -> AppResult<NewCasting> {
        self.check().map_err(|problems| {
            let mut errors = Errors::default();
            for (field, message) in problems {
                errors.add(field, message);
            }
            AppError::Validation(errors.0)
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CastingRead {
    pub id: i32,
    pub actor: Option<ActorRead>,
    pub role_name: String,
    pub order: i32,
}

impl CastingRead {
    pub fn new(c: casting::Model, actor: Option<actor::Model>) -> Self {
        Self { id: c.id, actor: actor.map(Into::into), role_name: c.role_name, order: c.order }
    }
}

// -----------------------------------------------------------------------------
// Movies
// -----------------------------------------------------------------------------

/// Body of movie create and update. Absent keys leave the stored value alone
/// on update; `null` clears a nullable field.
#[derive(Debug, Default, Deserialize)]
pub struct MovieWrite {
    pub title_fr: Option<String>,
    pub title_original: Option<String>,
    pub origin_country: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub duration_minutes: Option<Option<i32>>,
    pub director: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub release_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub poster: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub illustration: Option<Option<String>>,
    pub cast: Option<Vec<CastingWrite>>,
}

/// Validated movie changes. Every `Some` is a value to store.
#[derive(Debug, Default, Clone)]
pub struct MovieChanges {
    pub title_fr: Option<String>,
    pub title_original: Option<String>,
    pub origin_country: Option<String>,
    pub duration_minutes: Option<Option<i32>>,
    pub director: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<Option<String>>,
    pub poster: Option<Option<String>>,
    pub illustration: Option<Option<String>>,
    pub cast: Option<Vec<NewCasting>>,
}

impl MovieWrite {
    /// `creating` makes `title_fr` mandatory.
    pub fn validate(self, creating: bool) -> AppResult<MovieChanges> {
        let mut errors = Errors::default();

        let title_fr = self.title_fr.map(|t| t.trim().to_string());
        match &title_fr {
            Some(t) if t.is_empty() => errors.add("title_fr", "This field may not be blank."),
            Some(t) => errors.max_chars("title_fr", t, 255),
            None if creating => errors.add("title_fr", "This field is required."),
            None => {}
        }
        if let Some(t) = &self.title_original {
            errors.max_chars("title_original", t, 255);
        }
        if let Some(c) = &self.origin_country {
            errors.max_chars("origin_country", c, 100);
        }
        if let Some(d) = &self.director {
            errors.max_chars("director", d, 255);
        }
        if let Some(Some(minutes)) = self.duration_minutes {
            if minutes < 0 {
                errors.add("duration_minutes", "Ensure this value is greater than or equal to 0.");
            }
        }
        let release_date = match self.release_date {
            Some(Some(raw)) => Some(errors.date("release_date", Some(raw.as_str()))),
            Some(None) => Some(None),
            None => None,
        };

        let cast = self.cast.map(|entries| {
            let mut valid = Vec::with_capacity(entries.len());
            for (i, entry) in entries.iter().enumerate() {
                match entry.check() {
                    Ok(c) => {
                        if valid.iter().any(|v: &NewCasting| {
                            v.actor_id == c.actor_id && v.role_name == c.role_name
                        }) {
                            errors.add(
                                "cast",
                                format!("[{i}] duplicates actor {} as {:?}.", c.actor_id, c.role_name),
                            );
                        }
                        valid.push(c);
                    }
                    Err(problems) => {
                        for (field, message) in problems {
                            errors.add("cast", format!("[{i}] {field}: {message}"));
                        }
                    }
                }
            }
            valid
        });

        errors.finish()?;

        Ok(MovieChanges {
            title_fr,
            title_original: self.title_original,
            origin_country: self.origin_country,
            duration_minutes: self.duration_minutes,
            director: self.director,
            description: self.description,
            release_date,
            poster: self.poster.map(|p| p.filter(|s| !s.is_empty())),
            illustration: self.illustration.map(|p| p.filter(|s| !s.is_empty())),
            cast,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct MovieListItem {
    pub id: i32,
    pub title_fr: String,
    pub title_original: String,
    pub poster: Option<String>,
    pub release_date: Option<String>,
    pub likes_count: u64,
    pub avg_rating: Option<f64>,
}

impl MovieListItem {
    pub fn new(m: movie::Model, likes_count: u64) -> Self {
        Self {
            id: m.id,
            title_fr: m.title_fr,
            title_original: m.title_original,
            poster: m.poster,
            release_date: m.release_date,
            likes_count,
            avg_rating: m.avg_rating,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MovieDetail {
    pub id: i32,
    pub title_fr: String,
    pub title_original: String,
    pub origin_country: String,
    pub duration_minutes: Option<i32>,
    pub duration: String,
    pub director: String,
    pub description: String,
    pub release_date: Option<String>,
    pub poster: Option<String>,
    pub illustration: Option<String>,
    pub likes_count: u64,
    pub avg_rating: Option<f64>,
    pub cast: Vec<CastingRead>,
    pub comments: Vec<CommentRead>,
    pub user_liked: bool,
    pub user_rating: Option<i16>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// What the detail view knows about the caller's own engagement.
#[derive(Debug, Default, Clone, Copy)]
pub struct ViewerState {
    pub liked: bool,
    pub rating: Option<i16>,
}

impl MovieDetail {
    pub fn new(
        m: movie::Model,
        likes_count: u64,
        cast: Vec<CastingRead>,
        comments: Vec<CommentRead>,
        viewer: ViewerState,
    ) -> Self {
        Self {
            id: m.id,
            duration: format_duration(m.duration_minutes),
            title_fr: m.title_fr,
            title_original: m.title_original,
            origin_country: m.origin_country,
            duration_minutes: m.duration_minutes,
            director: m.director,
            description: m.description,
            release_date: m.release_date,
            poster: m.poster,
            illustration: m.illustration,
            likes_count,
            avg_rating: m.avg_rating,
            cast,
            comments,
            user_liked: viewer.liked,
            user_rating: viewer.rating,
            created_at: timestamp(m.created_at),
            updated_at: timestamp(m.updated_at),
        }
    }
}

// -----------------------------------------------------------------------------
// Comments
// -----------------------------------------------------------------------------

/// Only `text` is read; `movie` and `author` come from the path and the caller.
#[derive(Debug, Deserialize)]
pub struct CommentWrite {
    pub text: Option<String>,
}

impl CommentWrite {
    pub fn validate(self) -> AppResult<String> {
        let Some(text) = self.text else {
            return Err(AppError::field("text", "This field is required."));
        };
        validate_comment_text(&text)
    }
}

/// Trims and checks a comment body.
pub fn validate_comment_text(text: &str) -> AppResult<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::field("text", "Comment is empty."));
    }
    if text.chars().count() > COMMENT_MAX_CHARS {
        return Err(AppError::field(
            "text",
            format!("Too long (max {COMMENT_MAX_CHARS} characters)."),
        ));
    }
    Ok(text.to_string())
}

#[derive(Debug, Serialize)]
pub struct CommentRead {
    pub id: i32,
    pub movie: i32,
    pub author: Option<i32>,
    pub author_username: Option<String>,
    pub text: String,
    pub created_at: Timestamp,
}

impl CommentRead {
    pub fn new(c: comment::Model, author: Option<user::Model>) -> Self {
        Self {
            id: c.id,
            movie: c.movie_id,
            author: c.author_id,
            author_username: author.map(|a| a.username),
            text: c.text,
            created_at: timestamp(c.created_at),
        }
    }
}

// -----------------------------------------------------------------------------
// Likes and ratings
// -----------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct LikeToggled {
    pub liked: bool,
    pub likes_count: u64,
}

/// `score` stays loosely typed so a wrong type becomes a field error rather
/// than a body rejection.
#[derive(Debug, Deserialize)]
pub struct RatingWrite {
    pub score: Option<Value>,
    #[serde(default)]
    pub review: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRating {
    pub score: i16,
    /// `None` keeps the review already on file.
    pub review: Option<String>,
}

impl RatingWrite {
    pub fn validate(self) -> AppResult<NewRating> {
        let score = parse_score(self.score.as_ref())?;
        Ok(NewRating { score, review: self.review })
    }
}

/// Accepts integral JSON numbers and numeric strings in `0..=10`.
pub fn parse_score(value: Option<&Value>) -> AppResult<i16> {
    let not_integer = || AppError::field("score", "A valid integer is required.");
    let score = match value {
        None | Some(Value::Null) => return Err(AppError::field("score", "This field is required.")),
        Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i,
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e9 => f as i64,
            _ => return Err(not_integer()),
        },
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| not_integer())?,
        Some(_) => return Err(not_integer()),
    };
    if !(SCORE_MIN..=SCORE_MAX).contains(&score) {
        return Err(AppError::field(
            "score",
            format!("Score must be between {SCORE_MIN} and {SCORE_MAX}."),
        ));
    }
    Ok(score as i16)
}

#[derive(Debug, Serialize)]
pub struct RatingRead {
    pub id: i32,
    pub score: i16,
    pub review: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<rating::Model> for RatingRead {
    fn from(r: rating::Model) -> Self {
        Self {
            id: r.id,
            score: r.score,
            review: r.review,
            created_at: timestamp(r.created_at),
            updated_at: timestamp(r.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Rated {
    pub rating: RatingRead,
    pub avg_rating: f64,
}
