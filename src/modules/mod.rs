pub mod diagnostic;

pub mod models {
    pub mod api_token;
    pub mod car_model;
    pub mod game_title;
    pub mod lap_record;
    pub mod lap_time;
    pub mod track;
    pub mod user;

    pub mod general;
}

pub mod helpers {
    pub mod lap_time;
    pub mod request;
    pub mod security;

    pub mod general;
    pub mod logging;
    pub mod math;

    pub mod guards {
        pub mod auth_user;
    }
}
