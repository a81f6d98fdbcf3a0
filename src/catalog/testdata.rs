//! Small catalog documents shared by the catalog tests.

pub const CATEGORY_JSON: &str = r#"{
  "format_version": 2,
  "description": "Curated facets",
  "generated_at": "2024-06-01T00:00:00Z",
  "categories": {
    "by_rating": {
      "5_stars": ["gd77-05-08.sbd.hicks.4982.sbeok.shnf", "gd1972-08-27.sbd.orf.3328"],
      "4_stars": ["gd90-03-29.sbd.miller.97.sbeok.flac16"]
    },
    "by_era": {
      "pigpen_era": ["gd69-02-27.aud.fillmore"],
      "europe_72_era": ["gd1972-08-27.sbd.orf.3328"],
      "brent_era": ["gd90-03-29.sbd.miller.97.sbeok.flac16", "1981-05-08_Nassau_Coliseum"]
    },
    "iconic_venues": {
      "fillmore": ["gd69-02-27.aud.fillmore"],
      "barton_hall": ["gd77-05-08.sbd.hicks.4982.sbeok.shnf"]
    },
    "venue_types": {
      "arena": ["gd90-03-29.sbd.miller.97.sbeok.flac16", "1981-05-08_Nassau_Coliseum"],
      "outdoor": ["gd1972-08-27.sbd.orf.3328"]
    },
    "recording_types": {
      "soundboard": ["gd77-05-08.sbd.hicks.4982.sbeok.shnf", "gd1972-08-27.sbd.orf.3328"],
      "audience": ["gd69-02-27.aud.fillmore"]
    },
    "regions": {
      "northeast": ["gd77-05-08.sbd.hicks.4982.sbeok.shnf", "1981-05-08_Nassau_Coliseum"],
      "west_coast": ["gd69-02-27.aud.fillmore", "gd1972-08-27.sbd.orf.3328"]
    },
    "by_state": {
      "NY": ["gd77-05-08.sbd.hicks.4982.sbeok.shnf", "1981-05-08_Nassau_Coliseum"],
      "OR": ["gd1972-08-27.sbd.orf.3328"]
    },
    "seasons": {
      "spring": ["gd77-05-08.sbd.hicks.4982.sbeok.shnf", "gd90-03-29.sbd.miller.97.sbeok.flac16"],
      "summer": ["gd1972-08-27.sbd.orf.3328"]
    },
    "by_decade": {"1970s": ["gd77-05-08.sbd.hicks.4982.sbeok.shnf", "gd1972-08-27.sbd.orf.3328"]},
    "by_year": {"1977": ["gd77-05-08.sbd.hicks.4982.sbeok.shnf"]},
    "by_month": {"05": ["gd77-05-08.sbd.hicks.4982.sbeok.shnf", "1981-05-08_Nassau_Coliseum"]},
    "notable_performances": {
      "cornell_77": ["gd77-05-08.sbd.hicks.4982.sbeok.shnf"],
      "sunshine_daydream": ["gd1972-08-27.sbd.orf.3328"]
    },
    "special_shows": {
      "first_show": "gd65-12-04",
      "last_show": ["gd95-07-09"]
    },
    "jerry_moods": {"cosmic": ["gd1972-08-27.sbd.orf.3328"]}
  }
}"#;

pub const ENRICHED_JSON: &str = r#"{
  "last_updated": "2024-06-01",
  "stats": {"total_shows": 5, "avg_score": 8.9},
  "best_shows": {
    "gd77-05-08.sbd.hicks.4982.sbeok.shnf": {
      "identifier": "gd77-05-08.sbd.hicks.4982.sbeok.shnf",
      "score": 9.8,
      "location": {"venue": "Barton Hall", "city": "Ithaca", "state": "NY"},
      "source_type": "sbd",
      "avg_rating": 4.9,
      "downloads": 120000,
      "num_reviews": 310,
      "title": "Grateful Dead Live at Barton Hall on 1977-05-08",
      "lineage": "SBD > Reel > DAT",
      "weather": "snowing",
      "tracks": [
        {"title": "El Paso", "filename": "gd77-05-08d1t03.shn", "duration": "4:31", "track": "3"},
        {"title": "New Minglewood Blues", "filename": "gd77-05-08d1t01.shn", "duration": "5:35", "track": 1},
        {"title": "Loser", "filename": "gd77-05-08d1t02.shn", "duration": "7:24", "track": "2/12"}
      ]
    },
    "gd1972-08-27.sbd.orf.3328": {
      "identifier": "gd1972-08-27.sbd.orf.3328",
      "score": 9.6,
      "location": {"venue": "Old Renaissance Faire Grounds", "city": "Veneta", "state": "OR"},
      "source": "soundboard",
      "tracks": [
        {"title": "Promised Land", "filename": "gd72-08-27d1t01.flac", "duration": "3:41"},
        {"title": "Sugaree", "filename": "gd72-08-27d1t02.flac", "duration": "7:50"}
      ]
    },
    "nassau81": {
      "identifier": "1981-05-08_Nassau_Coliseum",
      "score": 8.1,
      "location": {"venue": "Nassau Coliseum", "city": "Uniondale", "state": "NY"},
      "source_type": "matrix",
      "tracks": [
        {"title": "Alabama Getaway", "filename": "1981-05-08t01.mp3", "duration": "5:02"}
      ]
    },
    "branford": {
      "identifier": "gd90-03-29.sbd.miller.97.sbeok.flac16",
      "score": 9.2,
      "location": {"venue": "Nassau Coliseum", "city": "Uniondale", "state": "NY"},
      "source_type": "SBD",
      "num_downloads": 48211,
      "notes": "Branford Marsalis sits in",
      "youtube_id": "dQw4branford",
      "tracks": [
        {"title": "Eyes of the World", "filename": "gd90-03-29d2t01.flac", "duration": "16:02"},
        {"title": "Dark Star", "filename": "gd90-03-29d2t02.flac", "duration": "17:45"}
      ]
    },
    "gd69-02-27.aud.fillmore": {
      "identifier": "gd69-02-27.aud.fillmore",
      "score": 7.4,
      "location": {"venue": "Fillmore West", "city": "San Francisco", "state": "CA"},
      "source_type": "aud",
      "tracks": [
        {"title": "Dark Star", "filename": "gd69-02-27t01.mp3", "duration": "23:10"}
      ]
    }
  }
}"#;
