use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use log::{error, info};
use serde::Serialize;

use crate::errors::{CustomResult, Error};
use crate::macros::database_error_handler::db_handle_get_error;
use crate::modules::helpers::lap_time::LapTimeHelper;
use crate::modules::helpers::math::Math;
use crate::modules::models::car_model::CarModel;
use crate::modules::models::game_title::GameTitle;
use crate::modules::models::lap_time::{LapTime, NewLapTime};
use crate::modules::models::track::Track;
use crate::modules::models::user::User;
use crate::schema::{car_models, game_titles, lap_records, tracks, users};

pub const MAX_NOTE_LENGTH: usize = 1000;

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = lap_records)]
pub struct NewLapRecord {
    pub user_id: i32,
    pub game_title_id: i32,
    pub car_model_id: i32,
    pub track_id: i32,
    pub total_time: String,
    pub total_seconds: f64,
    pub lap_count: i32,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
}

/// one recorded session: the laps, their derived total and who drove them.
/// records are never updated, they only disappear with their owner.
#[derive(Queryable, Selectable, Identifiable, Associations, Serialize, PartialEq, Debug, Clone)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(GameTitle))]
#[diesel(belongs_to(CarModel))]
#[diesel(belongs_to(Track))]
#[diesel(table_name = lap_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LapRecord {
    pub id: i32,
    pub user_id: i32,
    pub game_title_id: i32,
    pub car_model_id: i32,
    pub track_id: i32,
    pub total_time: String,
    pub total_seconds: f64,
    pub lap_count: i32,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
}

/// everything needed to store a lap record, resolved by the caller
pub struct LapSubmission<'a> {
    pub game_title: &'a GameTitle,
    pub car_model: &'a CarModel,
    pub track: &'a Track,
    pub lap_times: &'a [String],
    pub note: Option<&'a str>,
}

/// optional catalog filters for listing and statistics
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct RecordFilter {
    pub game_title_id: Option<i32>,
    pub car_model_id: Option<i32>,
    pub track_id: Option<i32>,
}

/// a record together with the names of its game, car and track
#[derive(Debug, Clone)]
pub struct RecordWithNames {
    pub record: LapRecord,
    pub game_title: String,
    pub car_model: String,
    pub track_name: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RecordStats {
    pub records: usize,
    pub best_total: Option<String>,
    pub average_total: Option<String>,
    pub median_total: Option<String>,
}

impl LapRecord {
    /************ INSERTERS ************/
    /// # record a session
    /// the lap times are validated against the track's lap count and summed
    /// before anything is written. the record and its laps are inserted in a
    /// single transaction, so a submission is stored completely or not at all.
    ///
    /// ## Arguments
    /// * `conn` - The database connection to use
    /// * `owner` - The user that drove the laps
    /// * `submission` - The catalog entries, lap times and note
    ///
    /// ## Returns
    /// * `(LapRecord, Vec<LapTime>)` - The stored record and its laps
    pub fn record(conn: &mut SqliteConnection, owner: &User, submission: LapSubmission) -> CustomResult<(LapRecord, Vec<LapTime>)> {
        let totals = LapTimeHelper::aggregate(submission.lap_times, submission.track.expected_laps())?;

        let note = match submission.note.map(str::trim) {
            Some(note) if note.chars().count() > MAX_NOTE_LENGTH => {
                return Err(Error::InvalidInputError {
                    field: "note".to_string(),
                    reason: format!("must be at most {MAX_NOTE_LENGTH} characters"),
                });
            }
            Some(note) if !note.is_empty() => Some(note.to_string()),
            _ => None,
        };

        let new_record = NewLapRecord {
            user_id: owner.id,
            game_title_id: submission.game_title.id,
            car_model_id: submission.car_model.id,
            track_id: submission.track.id,
            total_time: totals.display,
            total_seconds: totals.seconds,
            lap_count: submission.track.lap_count,
            note,
            created_at: Utc::now().naive_utc(),
        };

        let stored = conn.transaction::<_, Error, _>(|conn| {
            let record = diesel::insert_into(lap_records::table)
                .values(&new_record)
                .returning(LapRecord::as_returning())
                .get_result(conn)?;

            let mut laps = Vec::with_capacity(submission.lap_times.len());
            for (lap_number, time) in (1..).zip(submission.lap_times) {
                laps.push(LapTime::new(conn, &NewLapTime {
                    lap_record_id: record.id,
                    lap_number,
                    time: time.clone(),
                })?);
            }

            Ok((record, laps))
        });

        match stored {
            Ok((record, laps)) => {
                info!(target: "models/lap_record:record", "user {} recorded {} on track {} (record {})", owner.id, record.total_time, record.track_id, record.id);
                Ok((record, laps))
            }
            Err(error) => {
                error!(target: "models/lap_record:record", "Error storing lap record for user {}: {}", owner.id, error);
                Err(error)
            }
        }
    }

    /************ GETTERS ************/
    pub fn get_by_id(conn: &mut SqliteConnection, id_in: i32) -> QueryResult<LapRecord> {
        use crate::schema::lap_records::dsl::*;

        lap_records.filter(id.eq(id_in))
            .select(LapRecord::as_select())
            .first(conn)
    }

    /// # get a single record with the names of its game, car and track
    pub fn get_with_names(conn: &mut SqliteConnection, id_in: i32) -> QueryResult<RecordWithNames> {
        let record = db_handle_get_error!(LapRecord::get_by_id(conn, id_in), "models/lap_record:get_with_names", "lap record");
        record.with_names(conn)
    }

    pub fn with_names(self, conn: &mut SqliteConnection) -> QueryResult<RecordWithNames> {
        let (game_title, car_model, track_name) = lap_records::table
            .inner_join(game_titles::table)
            .inner_join(car_models::table)
            .inner_join(tracks::table)
            .filter(lap_records::id.eq(self.id))
            .select((game_titles::name, car_models::name, tracks::name))
            .first::<(String, String, String)>(conn)?;

        Ok(RecordWithNames {
            record: self,
            game_title,
            car_model,
            track_name,
        })
    }

    /// # get the records of a user
    /// newest first, optionally narrowed down to a game, car or track
    ///
    /// ## Arguments
    /// * `conn` - The database connection to use
    /// * `owner` - The user whose records to get
    /// * `filter` - The catalog filters
    ///
    /// ## Returns
    /// * `Vec<RecordWithNames>` - The matching records
    pub fn from_user(conn: &mut SqliteConnection, owner: &User, filter: &RecordFilter) -> QueryResult<Vec<RecordWithNames>> {
        let mut query = lap_records::table
            .inner_join(game_titles::table)
            .inner_join(car_models::table)
            .inner_join(tracks::table)
            .filter(lap_records::user_id.eq(owner.id))
            .order((lap_records::created_at.desc(), lap_records::id.desc()))
            .select((LapRecord::as_select(), game_titles::name, car_models::name, tracks::name))
            .into_boxed();

        if let Some(game_title) = filter.game_title_id {
            query = query.filter(lap_records::game_title_id.eq(game_title));
        }
        if let Some(car_model) = filter.car_model_id {
            query = query.filter(lap_records::car_model_id.eq(car_model));
        }
        if let Some(track) = filter.track_id {
            query = query.filter(lap_records::track_id.eq(track));
        }

        let rows = query.load::<(LapRecord, String, String, String)>(conn)?;

        Ok(rows
            .into_iter()
            .map(|(record, game_title, car_model, track_name)| RecordWithNames {
                record,
                game_title,
                car_model,
                track_name,
            })
            .collect())
    }

    /// # get the leaderboard of a combination
    /// the fastest totals first. ties keep the earliest record in front.
    pub fn leaderboard(
        conn: &mut SqliteConnection,
        game_title_in: i32,
        car_model_in: i32,
        track_in: i32,
        limit: i64,
    ) -> QueryResult<Vec<(LapRecord, String)>> {
        lap_records::table
            .inner_join(users::table)
            .filter(lap_records::game_title_id.eq(game_title_in))
            .filter(lap_records::car_model_id.eq(car_model_in))
            .filter(lap_records::track_id.eq(track_in))
            .order((lap_records::total_seconds.asc(), lap_records::created_at.asc(), lap_records::id.asc()))
            .limit(limit)
            .select((LapRecord::as_select(), users::username))
            .load::<(LapRecord, String)>(conn)
    }

    /// the totals in seconds of a user's records that match the filter
    pub fn totals_from_user(conn: &mut SqliteConnection, owner: &User, filter: &RecordFilter) -> QueryResult<Vec<f64>> {
        let mut query = lap_records::table
            .filter(lap_records::user_id.eq(owner.id))
            .select(lap_records::total_seconds)
            .into_boxed();

        if let Some(game_title) = filter.game_title_id {
            query = query.filter(lap_records::game_title_id.eq(game_title));
        }
        if let Some(car_model) = filter.car_model_id {
            query = query.filter(lap_records::car_model_id.eq(car_model));
        }
        if let Some(track) = filter.track_id {
            query = query.filter(lap_records::track_id.eq(track));
        }

        query.load::<f64>(conn)
    }

    /************ UTILS ************/
    /// # get the stats of totals
    /// best, average and median total, rendered like any other total
    pub fn get_stats_of_totals(totals: &[f64]) -> RecordStats {
        RecordStats {
            records: totals.len(),
            best_total: Math::minimum(totals).map(LapTimeHelper::format_total),
            average_total: Math::mean(totals).map(LapTimeHelper::format_total),
            median_total: Math::median(totals).map(LapTimeHelper::format_total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::models::general::test_helpers::test_pool;

    struct Fixture {
        user: User,
        game: GameTitle,
        car: CarModel,
        track: Track,
    }

    fn fixture(conn: &mut SqliteConnection) -> Fixture {
        let user = User::register(conn, "fixture", "fixture@example.com", "long enough").unwrap();
        Fixture {
            game: GameTitle::new(conn, "Gran Turismo 7", &user).unwrap(),
            car: CarModel::new(conn, "Nissan GT-R", &user).unwrap(),
            track: Track::new(conn, "Suzuka Circuit", 2, &user).unwrap(),
            user,
        }
    }

    fn submit(conn: &mut SqliteConnection, f: &Fixture, laps: &[&str]) -> CustomResult<(LapRecord, Vec<LapTime>)> {
        let laps: Vec<String> = laps.iter().map(|lap| lap.to_string()).collect();
        LapRecord::record(conn, &f.user, LapSubmission {
            game_title: &f.game,
            car_model: &f.car,
            track: &f.track,
            lap_times: &laps,
            note: Some("  test run "),
        })
    }

    fn count_laps(conn: &mut SqliteConnection) -> i64 {
        use crate::schema::lap_times::dsl::*;
        lap_times.count().get_result(conn).unwrap()
    }

    #[test]
    fn stores_record_with_derived_total() {
        let (_dir, pool) = test_pool();
        let conn = &mut pool.get().unwrap();
        let f = fixture(conn);

        let (record, laps) = submit(conn, &f, &["01:30.000", "01:31.000"]).unwrap();
        assert_eq!(record.total_time, "03:01.000");
        assert_eq!(record.total_seconds, 181.0);
        assert_eq!(record.lap_count, 2);
        assert_eq!(record.note.as_deref(), Some("test run"));
        assert_eq!(laps.iter().map(|lap| lap.lap_number).collect::<Vec<_>>(), vec![1, 2]);

        let reloaded = LapTime::from_record(conn, &record).unwrap();
        assert_eq!(reloaded, laps);
    }

    #[test]
    fn invalid_submissions_store_nothing() {
        let (_dir, pool) = test_pool();
        let conn = &mut pool.get().unwrap();
        let f = fixture(conn);

        assert!(matches!(
            submit(conn, &f, &["01:30.000"]),
            Err(Error::InvalidLapsError { .. })
        ));
        assert!(matches!(
            submit(conn, &f, &["01:30.000", "1:31"]),
            Err(Error::InvalidLapsError { .. })
        ));

        let totals = LapRecord::totals_from_user(conn, &f.user, &RecordFilter::default()).unwrap();
        assert!(totals.is_empty());
        assert_eq!(count_laps(conn), 0);
    }

    #[test]
    fn records_cascade_with_their_owner() {
        let (_dir, pool) = test_pool();
        let conn = &mut pool.get().unwrap();
        let f = fixture(conn);
        let (record, _) = submit(conn, &f, &["01:30.000", "01:31.000"]).unwrap();

        f.user.delete(conn).unwrap();

        assert!(matches!(LapRecord::get_by_id(conn, record.id), Err(diesel::result::Error::NotFound)));
        assert_eq!(count_laps(conn), 0);
    }

    #[test]
    fn lists_newest_first_with_filters() {
        let (_dir, pool) = test_pool();
        let conn = &mut pool.get().unwrap();
        let f = fixture(conn);
        let other_track = Track::new(conn, "Monza", 2, &f.user).unwrap();

        let (first, _) = submit(conn, &f, &["01:30.000", "01:31.000"]).unwrap();
        let (second, _) = submit(conn, &f, &["01:29.000", "01:31.000"]).unwrap();

        let all = LapRecord::from_user(conn, &f.user, &RecordFilter::default()).unwrap();
        assert_eq!(all.iter().map(|r| r.record.id).collect::<Vec<_>>(), vec![second.id, first.id]);
        assert_eq!(all[0].track_name, "Suzuka Circuit");
        assert_eq!(all[0].game_title, "Gran Turismo 7");

        let filtered = LapRecord::from_user(conn, &f.user, &RecordFilter {
            track_id: Some(other_track.id),
            ..RecordFilter::default()
        })
        .unwrap();
        assert!(filtered.is_empty());

        let grouped = LapTime::from_records(conn, &[second.clone(), first.clone()]).unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0][0].time, "01:29.000");
        assert_eq!(grouped[1][0].time, "01:30.000");
    }

    #[test]
    fn leaderboard_orders_by_total() {
        let (_dir, pool) = test_pool();
        let conn = &mut pool.get().unwrap();
        let f = fixture(conn);

        submit(conn, &f, &["01:35.000", "01:35.000"]).unwrap();
        submit(conn, &f, &["01:29.000", "01:29.500"]).unwrap();

        let board = LapRecord::leaderboard(conn, f.game.id, f.car.id, f.track.id, 10).unwrap();
        let totals: Vec<&str> = board.iter().map(|(record, _)| record.total_time.as_str()).collect();
        assert_eq!(totals, vec!["02:58.500", "03:10.000"]);
        assert_eq!(board[0].1, "fixture");
    }

    #[test]
    fn stats_over_totals() {
        let stats = LapRecord::get_stats_of_totals(&[181.0, 179.5, 190.0]);
        assert_eq!(stats.records, 3);
        assert_eq!(stats.best_total.as_deref(), Some("02:59.500"));
        assert_eq!(stats.median_total.as_deref(), Some("03:01.000"));
        assert_eq!(stats.average_total.as_deref(), Some("03:03.500"));

        let empty = LapRecord::get_stats_of_totals(&[]);
        assert_eq!(empty.records, 0);
        assert_eq!(empty.best_total, None);
    }
}
